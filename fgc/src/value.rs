//! `Value`: a [`Val`] paired with a resolved (pointer, size) cache.
//!
//! `Value` is the fat-pointer companion clients actually work with: it
//! exists only in mutator-local storage (the Rust stack, a local variable,
//! or a registered [`Handle`](crate::handle::Handle)) and is never embedded
//! inside a heap block -- blocks only ever store bare [`Val`] words.
//!
//! Because a `Value`'s cached [`Block`] pointer becomes stale the instant
//! the GC relocates its referent, any `Value` that must survive a
//! collection has to be registered as an external root (see
//! [`crate::handle`]).

use crate::block::{Block, Type};
use crate::heap::Heap;
use crate::val::Val;
use std::fmt;

/// The dynamic type of a [`Value`]: either one of the three immediate
/// kinds, or one of the eight block [`Type`]s for an object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Int,
    Object(Type),
}

/// A `Val` plus, if it refers to an object, the resolved block.
#[derive(Clone, Copy)]
pub struct Value {
    val: Val,
    block: Option<Block>,
}

impl Value {
    pub const NULL: Value = Value { val: Val::NULL, block: None };

    /// Resolves `val` against `heap`, caching the target block's pointer if
    /// `val` is an object reference.
    pub fn new(val: Val, heap: &Heap) -> Value {
        let block = if val.is_object() { Some(heap.block_at(val.as_offset())) } else { None };
        Value { val, block }
    }

    /// Builds an object `Value` directly from a block already known to
    /// live in `heap`, without re-deriving its type from the raw `Val`.
    pub fn from_block(heap: &Heap, block: Block) -> Value {
        let offset = heap.offset_of(block);
        Value { val: Val::object(offset), block: Some(block) }
    }

    pub fn val(&self) -> Val {
        self.val
    }

    pub fn block(&self) -> Option<Block> {
        self.block
    }

    pub fn is_null(&self) -> bool {
        self.val.is_null()
    }

    pub fn is_bool(&self) -> bool {
        self.val.is_bool()
    }

    pub fn as_bool(&self) -> bool {
        self.val.as_bool()
    }

    pub fn is_int(&self) -> bool {
        self.val.is_int()
    }

    pub fn as_int(&self) -> i32 {
        self.val.as_int()
    }

    pub fn is_object(&self) -> bool {
        self.val.is_object()
    }

    /// The kind of value this is; for objects, the block's type code.
    pub fn kind(&self) -> Kind {
        if self.val.is_int() {
            Kind::Int
        } else if self.val.is_bool() {
            Kind::Bool
        } else if let Some(block) = self.block {
            Kind::Object(block.type_())
        } else {
            Kind::Null
        }
    }

    pub fn is<T: crate::object::ObjectKind>(&self) -> bool {
        matches!(self.kind(), Kind::Object(t) if t == T::TYPE)
    }

    /// Downcasts to a typed object wrapper if this value's block type
    /// matches `T`.
    pub fn as_kind<T: crate::object::ObjectKind>(&self) -> Option<T> {
        self.block.filter(|b| b.type_() == T::TYPE).map(T::from_block)
    }

    /// Rewrites this value in place to point at `new_block` in the heap's
    /// new location. Called only by the GC while updating external roots.
    pub(crate) fn relocate(&mut self, heap: &Heap, new_block: Block) {
        let offset = heap.offset_of(new_block);
        self.val = Val::object(offset);
        self.block = Some(new_block);
    }
}

impl PartialEq for Value {
    /// Bitwise `Val` equality: two object values are equal iff they refer
    /// to the same block. Strings, arrays, and dicts are never compared
    /// structurally.
    fn eq(&self, other: &Self) -> bool {
        self.val == other.val
    }
}

impl Eq for Value {}

impl From<Val> for Value {
    /// Wraps a `Val` with no resolved block; only valid for non-object
    /// `Val`s (null, bool, int). Use [`Value::new`] to resolve an object
    /// reference against its heap.
    fn from(val: Val) -> Self {
        debug_assert!(!val.is_object(), "object Val requires a heap to resolve");
        Value { val, block: None }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::from(Val::int(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from(Val::bool(b))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Kind::Null => write!(f, "null"),
            Kind::Bool => write!(f, "{}", self.as_bool()),
            Kind::Int => write!(f, "{}", self.as_int()),
            Kind::Object(t) => write!(f, "<{t} @{}>", self.val.as_offset()),
        }
    }
}
