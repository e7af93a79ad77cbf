//! JSON import/export, living entirely on top of the public
//! allocation and value surface -- no privileged access to block internals.
//!
//! Grown containers follow a x1.5 growth factor (`size + size/2`) rather
//! than doubling, since a parsed document's shape is
//! rarely known in advance and 1.5x keeps the amortized-copy overhead low
//! without wasting much space on the common case of small arrays/objects.

use crate::heap::Heap;
use crate::object::{Array, BigInt, Blob, Dict, Float, HeapString, ObjectKind, Symbol, Vector};
use crate::symbol_table::SymbolTable;
use crate::val::Val;
use crate::value::{Kind, Value};
use crate::Type;

const INITIAL_CONTAINER_CAPACITY: u32 = 4;

fn grow(capacity: u32) -> u32 {
    (capacity + capacity / 2).max(capacity + 1)
}

/// Parses `json` into a tree of heap-allocated values, returning the root.
///
/// Objects become [`Dict`]s keyed by interned [`Symbol`]s; arrays become
/// [`Vector`]s; numbers that fit a small int stay immediate, otherwise they
/// promote to a [`BigInt`] or [`Float`] block exactly as [`BigInt::val_for`]
/// and [`Float::new`] already do elsewhere in the library.
pub fn parse(heap: &mut Heap, json: &str) -> crate::error::Result<Value> {
    let parsed: serde_json::Value = serde_json::from_str(json)?;
    let val = build(heap, &parsed).ok_or_else(|| crate::error::HeapError::OutOfSpace {
        requested: 0,
        available: heap.available(),
    })?;
    Ok(Value::new(val, heap))
}

fn build(heap: &mut Heap, jv: &serde_json::Value) -> Option<Val> {
    match jv {
        serde_json::Value::Null => Some(Val::NULL),
        serde_json::Value::Bool(b) => Some(Val::bool(*b)),
        serde_json::Value::Number(n) => build_number(heap, n),
        serde_json::Value::String(s) => HeapString::new(heap, s).map(|s| Val::object(heap.offset_of(s.block()))),
        serde_json::Value::Array(items) => build_array(heap, items),
        serde_json::Value::Object(map) => build_object(heap, map),
    }
}

fn build_number(heap: &mut Heap, n: &serde_json::Number) -> Option<Val> {
    if let Some(i) = n.as_i64() {
        BigInt::val_for(heap, i)
    } else {
        let f = n.as_f64()?;
        Float::new(heap, f).map(|f| Val::object(heap.offset_of(f.block())))
    }
}

fn build_array(heap: &mut Heap, items: &[serde_json::Value]) -> Option<Val> {
    let mut vector = Vector::new(heap, INITIAL_CONTAINER_CAPACITY)?;
    for item in items {
        let v = build(heap, item)?;
        if !vector.append(v) {
            vector = grow_vector(heap, vector)?;
            if !vector.append(v) {
                return None;
            }
        }
    }
    Some(Val::object(heap.offset_of(vector.block())))
}

fn grow_vector(heap: &mut Heap, old: Vector) -> Option<Vector> {
    heap.grow(old, grow(old.capacity()))
}

fn build_object(heap: &mut Heap, map: &serde_json::Map<String, serde_json::Value>) -> Option<Val> {
    let mut dict = Dict::new(heap, INITIAL_CONTAINER_CAPACITY)?;
    for (k, v) in map {
        let key = SymbolTable::create(heap, k)?;
        let key_val = Val::object(heap.offset_of(key.block()));
        let val = build(heap, v)?;
        if !dict.insert(key_val, val) {
            dict = grow_dict(heap, dict)?;
            if !dict.insert(key_val, val) {
                return None;
            }
        }
    }
    Some(Val::object(heap.offset_of(dict.block())))
}

fn grow_dict(heap: &mut Heap, old: Dict) -> Option<Dict> {
    heap.grow(old, grow(old.capacity()))
}

/// Serializes a heap value back to a JSON string. Returns `None` if the
/// value (or something it transitively contains) is a [`Blob`], which has
/// no JSON representation.
pub fn stringify(heap: &Heap, value: Value) -> Option<String> {
    to_json_value(heap, value).map(|v| v.to_string())
}

fn to_json_value(heap: &Heap, value: Value) -> Option<serde_json::Value> {
    match value.kind() {
        Kind::Null => Some(serde_json::Value::Null),
        Kind::Bool => Some(serde_json::Value::Bool(value.as_bool())),
        Kind::Int => Some(serde_json::Value::Number(value.as_int().into())),
        Kind::Object(Type::String) => Some(serde_json::Value::String(value.as_kind::<HeapString>()?.as_str().to_string())),
        Kind::Object(Type::Symbol) => Some(serde_json::Value::String(value.as_kind::<Symbol>()?.as_str().to_string())),
        Kind::Object(Type::BigInt) => Some(serde_json::Value::Number(value.as_kind::<BigInt>()?.value().into())),
        Kind::Object(Type::Float) => {
            serde_json::Number::from_f64(value.as_kind::<Float>()?.value()).map(serde_json::Value::Number)
        }
        Kind::Object(Type::Array) => {
            let array = value.as_kind::<Array>()?;
            let mut out = Vec::new();
            for i in 0..array.used_len() {
                out.push(to_json_value(heap, Value::new(array.get(i), heap))?);
            }
            Some(serde_json::Value::Array(out))
        }
        Kind::Object(Type::Vector) => {
            let vector = value.as_kind::<Vector>()?;
            let mut out = Vec::new();
            for i in 0..vector.count() {
                out.push(to_json_value(heap, Value::new(vector.get(i), heap))?);
            }
            Some(serde_json::Value::Array(out))
        }
        Kind::Object(Type::Dict) => {
            let dict = value.as_kind::<Dict>()?;
            let mut out = serde_json::Map::new();
            for (k, v) in dict.iter() {
                let key = Value::new(k, heap).as_kind::<Symbol>()?;
                out.insert(key.as_str().to_string(), to_json_value(heap, Value::new(v, heap))?);
            }
            Some(serde_json::Value::Object(out))
        }
        Kind::Object(Type::Blob) => None,
    }
}
