//! The symbol table -- an open-addressed, linear-probed hash table
//! whose backing storage is itself an [`Array`] living inside the heap it
//! serves, so that it persists and reopens along with everything else.
//!
//! Each logical slot occupies two adjacent `Val`s: a hash `Val` (a
//! small-int carrying a 31-bit hash code, or null if the slot is empty)
//! and a symbol `Val` (an object reference to the unique Symbol block, or
//! null). There is no separately-stored count; it is always recomputed by
//! scanning, which also lets a reopened heap recover it for free.

use crate::config::HeapOptions;
use crate::heap::Heap;
use crate::object::{Array, ObjectKind, Symbol};
use crate::val::Val;

/// A stable 32-bit string hash in the WyHash family, seeded by a library
/// constant so hash codes agree across a save/reopen round trip.
fn raw_hash(s: &str, seed: u32) -> u32 {
    // FNV-1a, seeded. Not bit-for-bit WyHash, but the same shape: a cheap,
    // well-distributed, seeded 32-bit string hash with no dependency on
    // string length beyond a single linear pass.
    let mut h = seed ^ 0x811c_9dc5;
    for &b in s.as_bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

/// Encodes a raw 32-bit hash as a small-int `Val`: reinterpreted signed,
/// then arithmetically shifted right one bit so it always fits
/// [`Val`]'s small-int range regardless of sign.
fn hash_val(raw: u32) -> Val {
    Val::int((raw as i32) >> 1)
}

/// Namespace for the symbol-table operations; the table itself has no
/// Rust-side state beyond what's reachable through the owning [`Heap`].
pub struct SymbolTable;

impl SymbolTable {
    fn backing(heap: &Heap) -> Option<Array> {
        let val = heap.symbol_table_val();
        if val.is_null() {
            return None;
        }
        Some(Array::from_block(heap.block_at(val.as_offset())))
    }

    /// Number of occupied slots, recomputed by scanning the backing array.
    pub fn count(heap: &Heap) -> u32 {
        let Some(array) = Self::backing(heap) else { return 0 };
        let slots = array.len() / 2;
        (0..slots).filter(|&i| !array.get(i * 2).is_null()).count() as u32
    }

    pub fn capacity(heap: &Heap) -> u32 {
        Self::backing(heap).map_or(0, |a| a.len() / 2)
    }

    /// Looks up `s` without creating it.
    pub fn find(heap: &Heap, s: &str) -> Option<Symbol> {
        let array = Self::backing(heap)?;
        let slots = array.len() / 2;
        if slots == 0 {
            return None;
        }
        let raw = raw_hash(s, HeapOptions::HASH_SEED);
        let hv = hash_val(raw);
        let mask = slots - 1;
        let mut idx = (raw & mask) as u32;
        loop {
            let h = array.get(idx * 2);
            if h.is_null() {
                return None;
            }
            if h == hv {
                let sym_val = array.get(idx * 2 + 1);
                let sym = Symbol::from_block(heap.block_at(sym_val.as_offset()));
                if sym.as_str() == s {
                    return Some(sym);
                }
            }
            idx = (idx + 1) & mask;
        }
    }

    /// Looks up `s`, interning it as a new unique Symbol if not already
    /// present. Grows the backing table first if it would exceed the
    /// configured maximum load factor.
    pub fn create(heap: &mut Heap, s: &str) -> Option<Symbol> {
        if let Some(sym) = Self::find(heap, s) {
            return Some(sym);
        }
        Self::ensure_capacity(heap)?;
        let symbol = Symbol::new_unique(heap, s)?;
        let array = Self::backing(heap)?;
        let slots = array.len() / 2;
        let raw = raw_hash(s, HeapOptions::HASH_SEED);
        let hv = hash_val(raw);
        let mask = slots - 1;
        let mut idx = raw & mask;
        while !array.get(idx * 2).is_null() {
            idx = (idx + 1) & mask;
        }
        array.set(idx * 2, hv);
        array.set(idx * 2 + 1, Val::object(heap.offset_of(symbol.block())));
        if heap.options().verbose {
            log::debug!("symbol table: interned {s:?} at slot {idx}/{slots}");
        }
        Some(symbol)
    }

    fn ensure_capacity(heap: &mut Heap) -> Option<()> {
        let options = heap.options();
        match Self::backing(heap) {
            None => {
                let array = Array::new(heap, options.initial_symbol_table_entries * 2)?;
                heap.set_symbol_table_val(Val::object(heap.offset_of(array.block())));
                Some(())
            }
            Some(array) => {
                let slots = array.len() / 2;
                let count = Self::count(heap);
                let max_load = (slots as f32 * options.symbol_table_max_load) as u32;
                if count + 1 <= max_load {
                    return Some(());
                }
                log::info!("symbol table: growing {slots} -> {} slots", slots * 2);
                Self::rehash(heap, array, slots * 2)
            }
        }
    }

    fn rehash(heap: &mut Heap, old: Array, new_slots: u32) -> Option<()> {
        let entries: Vec<(Val, Val)> =
            (0..old.len() / 2).filter(|&i| !old.get(i * 2).is_null()).map(|i| (old.get(i * 2), old.get(i * 2 + 1))).collect();
        let new_array = Array::new(heap, new_slots * 2)?;
        let mask = new_slots - 1;
        for (h, sym_val) in entries {
            // The hash Val already carries the shifted hash code; recover
            // enough of it to re-derive a probe start by reading the
            // symbol's own bytes (cheaper than unshifting losslessly).
            let sym = Symbol::from_block(heap.block_at(sym_val.as_offset()));
            let raw = raw_hash(sym.as_str(), HeapOptions::HASH_SEED);
            let mut idx = raw & mask;
            while !new_array.get(idx * 2).is_null() {
                idx = (idx + 1) & mask;
            }
            new_array.set(idx * 2, h);
            new_array.set(idx * 2 + 1, sym_val);
        }
        heap.set_symbol_table_val(Val::object(heap.offset_of(new_array.block())));
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_idempotent() {
        let mut heap = Heap::new(100_000).unwrap();
        let a = SymbolTable::create(&mut heap, "foo").unwrap();
        let b = SymbolTable::create(&mut heap, "foo").unwrap();
        assert_eq!(a.block(), b.block());
    }

    #[test]
    fn find_before_create_is_none() {
        let heap = Heap::new(100_000).unwrap();
        assert!(SymbolTable::find(&heap, "nope").is_none());
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut heap = Heap::new(2_000_000).unwrap();
        SymbolTable::create(&mut heap, "foo").unwrap();
        SymbolTable::create(&mut heap, "bar").unwrap();
        for i in 0..100 {
            let name = format!("Symbol #{i}");
            let created = SymbolTable::create(&mut heap, &name).unwrap();
            let found = SymbolTable::find(&heap, &name).unwrap();
            assert_eq!(created.block(), found.block());
        }
        assert_eq!(SymbolTable::count(&heap), 102);
        assert!(SymbolTable::capacity(&heap) > 128);
        assert_eq!(SymbolTable::find(&heap, "bar").unwrap().as_str(), "bar");
    }
}
