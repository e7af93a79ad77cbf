//! Dict: a sorted sequence of (key, value) `Val` pairs, kept in descending
//! key order so that empty `(null, null)` slots sort to the end.

use super::{vals_of, Growable, ObjectKind};
use crate::block::{Block, Type};
use crate::heap::Heap;
use crate::val::Val;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Dict(Block);

impl Dict {
    /// Allocates a dict with room for `capacity` entries, all empty.
    pub fn new(heap: &mut Heap, capacity: u32) -> Option<Dict> {
        let block = heap.alloc_block(capacity * 2 * 4, Type::Dict)?;
        Some(Dict(block))
    }

    pub fn capacity(&self) -> u32 {
        self.0.data_size() / 8
    }

    fn key_at(&self, i: u32) -> Val {
        unsafe { vals_of(self.0).get_unchecked(i * 2) }
    }

    fn value_at(&self, i: u32) -> Val {
        unsafe { vals_of(self.0).get_unchecked(i * 2 + 1) }
    }

    fn set_pair(&self, i: u32, key: Val, value: Val) {
        unsafe {
            vals_of(self.0).set_unchecked(i * 2, key);
            vals_of(self.0).set_unchecked(i * 2 + 1, value);
        }
    }

    /// Number of non-empty entries: the first slot with a null key.
    pub fn count(&self) -> u32 {
        (0..self.capacity()).find(|&i| self.key_at(i).is_null()).unwrap_or(self.capacity())
    }

    pub fn is_full(&self) -> bool {
        self.count() == self.capacity()
    }

    /// Binary search for `key` among the `[0, count)` sorted entries.
    /// `Ok(i)` if found at slot `i`; `Err(i)` if not found, where `i` is
    /// the slot it should be inserted at to keep descending order.
    fn search(&self, key: Val) -> Result<u32, u32> {
        let count = self.count();
        let mut lo = 0u32;
        let mut hi = count;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match Val::key_cmp(self.key_at(mid), key) {
                std::cmp::Ordering::Equal => return Ok(mid),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Err(lo)
    }

    pub fn find(&self, key: Val) -> Option<Val> {
        self.search(key).ok().map(|i| self.value_at(i))
    }

    pub fn contains(&self, key: Val) -> bool {
        self.search(key).is_ok()
    }

    /// Overwrites the value if `key` is present; otherwise inserts it in
    /// sorted position, shifting later entries right by one slot. Fails
    /// if the dict is full and `key` is new.
    pub fn set(&self, key: Val, value: Val) -> bool {
        match self.search(key) {
            Ok(i) => {
                self.set_pair(i, key, value);
                true
            }
            Err(i) => self.insert_at(i, key, value),
        }
    }

    /// As [`Dict::set`], but fails (no-op) if `key` already exists.
    pub fn insert(&self, key: Val, value: Val) -> bool {
        match self.search(key) {
            Ok(_) => false,
            Err(i) => self.insert_at(i, key, value),
        }
    }

    /// Overwrites the value if `key` is present; fails if absent.
    pub fn replace(&self, key: Val, value: Val) -> bool {
        match self.search(key) {
            Ok(i) => {
                self.set_pair(i, key, value);
                true
            }
            Err(_) => false,
        }
    }

    fn insert_at(&self, at: u32, key: Val, value: Val) -> bool {
        let count = self.count();
        if count == self.capacity() {
            return false;
        }
        let mut i = count;
        while i > at {
            let (k, v) = (self.key_at(i - 1), self.value_at(i - 1));
            self.set_pair(i, k, v);
            i -= 1;
        }
        self.set_pair(at, key, value);
        true
    }

    /// Removes `key` if present, shifting later entries left and writing
    /// `(null, null)` into the vacated trailing slot. Returns whether
    /// anything was removed.
    pub fn remove(&self, key: Val) -> bool {
        let Ok(at) = self.search(key) else { return false };
        let count = self.count();
        for i in at..count - 1 {
            let (k, v) = (self.key_at(i + 1), self.value_at(i + 1));
            self.set_pair(i, k, v);
        }
        self.set_pair(count - 1, Val::NULL, Val::NULL);
        true
    }

    /// Re-sorts the `[0, count)` entries by current key bits. The GC calls
    /// this after every collection, since relocation changes object Vals'
    /// bit patterns and hence their sort order.
    pub fn sort(&self) {
        let count = self.count() as usize;
        let mut entries: Vec<(Val, Val)> = (0..count as u32).map(|i| (self.key_at(i), self.value_at(i))).collect();
        entries.sort_by(|a, b| Val::key_cmp(a.0, b.0));
        for (i, (k, v)) in entries.into_iter().enumerate() {
            self.set_pair(i as u32, k, v);
        }
    }

    /// Iterates non-empty entries in descending key order.
    pub fn iter(&self) -> impl Iterator<Item = (Val, Val)> + '_ {
        (0..self.count()).map(move |i| (self.key_at(i), self.value_at(i)))
    }
}

impl ObjectKind for Dict {
    const TYPE: Type = Type::Dict;

    fn from_block(block: Block) -> Self {
        Dict(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl Growable for Dict {
    fn capacity(&self) -> u32 {
        Dict::capacity(self)
    }

    fn allocate(heap: &mut Heap, capacity: u32) -> Option<Self> {
        Dict::new(heap, capacity)
    }

    fn copy_into(&self, grown: &Self) {
        for (k, v) in self.iter() {
            grown.insert(k, v);
        }
    }
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut heap = Heap::new(10_000).unwrap();
        let d = Dict::new(&mut heap, 5).unwrap();
        assert!(d.set(Val::int(1), Val::int(100)));
        assert!(d.set(Val::int(2), Val::int(200)));
        assert_eq!(d.find(Val::int(1)), Some(Val::int(100)));
        assert_eq!(d.find(Val::int(2)), Some(Val::int(200)));
        assert_eq!(d.find(Val::int(3)), None);
    }

    #[test]
    fn entries_stay_in_descending_order() {
        let mut heap = Heap::new(10_000).unwrap();
        let d = Dict::new(&mut heap, 5).unwrap();
        for k in [3, 1, 4, 1_000, 2] {
            d.set(Val::int(k), Val::int(k));
        }
        let keys: Vec<i32> = d.iter().map(|(k, _)| k.as_int()).collect();
        let mut sorted = keys.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(keys, sorted);
    }

    #[test]
    fn remove_shifts_and_clears_trailing_slot() {
        let mut heap = Heap::new(10_000).unwrap();
        let d = Dict::new(&mut heap, 5).unwrap();
        d.set(Val::int(1), Val::int(10));
        d.set(Val::int(2), Val::int(20));
        assert!(d.remove(Val::int(1)));
        assert!(!d.contains(Val::int(1)));
        assert_eq!(d.count(), 1);
        assert!(!d.remove(Val::int(1)));
    }

    #[test]
    fn insert_fails_on_duplicate_key_set_does_not() {
        let mut heap = Heap::new(10_000).unwrap();
        let d = Dict::new(&mut heap, 5).unwrap();
        assert!(d.insert(Val::int(1), Val::int(10)));
        assert!(!d.insert(Val::int(1), Val::int(99)));
        assert!(d.set(Val::int(1), Val::int(99)));
        assert_eq!(d.find(Val::int(1)), Some(Val::int(99)));
    }

    #[test]
    fn set_fails_when_full_and_key_is_new() {
        let mut heap = Heap::new(10_000).unwrap();
        let d = Dict::new(&mut heap, 2).unwrap();
        assert!(d.set(Val::int(1), Val::int(1)));
        assert!(d.set(Val::int(2), Val::int(2)));
        assert!(!d.set(Val::int(3), Val::int(3)));
    }
}
