//! The copying garbage collector.
//!
//! A classic Cheney semispace collector: everything reachable from the
//! roots is copied, breadth-first, into a freshly allocated to-heap of
//! the same capacity; the from-heap is then discarded by swapping its
//! backing storage with the to-heap's. A block that has already been
//! copied carries a *forwarding address* in its first four bytes, which
//! makes the move step idempotent and lets reference cycles collapse
//! into a single relocation.
//!
//! The one subtlety: while a moved container block sits in the to-heap
//! waiting to be scanned, its object-referring `Val`s still encode
//! *from-heap* offsets (a `Val`'s bit pattern is just a shifted offset --
//! it carries no notion of which heap it belongs to, so copying it
//! verbatim is sufficient). Only the drain loop below resolves those
//! offsets against the from-heap and rewrites them to to-heap offsets.
//! This means from-heap and to-heap never need to share an address space
//! or be within 32-bit arithmetic distance of each other.

use crate::block::{Block, Type};
use crate::handle::HandleId;
use crate::heap::Heap;
use crate::object::{Dict, ObjectKind};
use crate::val::Val;
use indexmap::IndexMap;
use std::collections::VecDeque;

pub struct GarbageCollector;

impl GarbageCollector {
    /// A snapshot of heap occupancy, broken down by block type. Ordered by
    /// first encounter during a linear walk, which in practice means
    /// allocation order -- handy for a human skimming CLI output.
    pub fn diagnostics(heap: &Heap) -> IndexMap<Type, (u32, u32)> {
        let mut counts: IndexMap<Type, (u32, u32)> = IndexMap::new();
        heap.visit_all(|block| {
            let entry = counts.entry(block.type_()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += block.occupied_size();
        });
        counts
    }
    /// Runs a full collection on `heap` in place: live data is copied into
    /// a fresh to-heap, unreachable data is dropped, and `heap`'s backing
    /// storage becomes the compacted result.
    ///
    /// # Panics
    /// If the to-heap runs out of space while copying. This should never
    /// happen -- collection only ever copies what was already live in the
    /// from-heap -- so a failure here indicates a broken invariant
    /// elsewhere and per the collector's contract is treated as fatal.
    pub fn run(heap: &mut Heap) {
        let used_before = heap.used();
        let mut to_heap =
            Heap::new(heap.capacity()).expect("to-heap allocation at the from-heap's capacity must succeed");
        let mut queue: VecDeque<Block> = VecDeque::new();
        let mut dicts: Vec<Block> = Vec::new();

        if heap.root_offset() != 0 {
            let new_off = Self::move_block(heap, &mut to_heap, heap.root_offset(), &mut queue, &mut dicts);
            to_heap.set_root_offset(new_off);
        }
        if heap.symbol_table_offset() != 0 {
            let new_off = Self::move_block(heap, &mut to_heap, heap.symbol_table_offset(), &mut queue, &mut dicts);
            to_heap.set_symbol_table_offset(new_off);
        }

        let handles = heap.handle_table();
        let snapshot: Vec<(HandleId, Val)> = handles.borrow().iter().collect();
        for (id, val) in snapshot {
            if val.is_object() {
                let new_off = Self::move_block(heap, &mut to_heap, val.as_offset(), &mut queue, &mut dicts);
                handles.borrow_mut().set(id, Val::object(new_off));
            }
        }

        Self::drain(heap, &mut to_heap, &mut queue, &mut dicts);

        for block in &dicts {
            Dict::from_block(*block).sort();
        }

        heap.swap_storage_with(&mut to_heap);
        log::info!(
            "gc: collected {} -> {} bytes used ({} blocks rewritten)",
            used_before,
            heap.used(),
            dicts.len()
        );
    }

    /// Breadth-first: for each to-heap container block already moved,
    /// resolve its still-from-heap-offset object `Val`s against the
    /// from-heap, moving their referents too and rewriting the `Val`s in
    /// place to to-heap offsets. Newly moved containers are pushed onto
    /// the same queue, so this terminates once nothing new is discovered.
    fn drain(from_heap: &Heap, to_heap: &mut Heap, queue: &mut VecDeque<Block>, dicts: &mut Vec<Block>) {
        while let Some(block) = queue.pop_front() {
            let vals = unsafe { to_heap.block_vals_mut(block) };
            for i in 0..vals.len() {
                let v = unsafe { vals.get_unchecked(i) };
                if v.is_object() {
                    let new_off = Self::move_block(from_heap, to_heap, v.as_offset(), queue, dicts);
                    unsafe { vals.set_unchecked(i, Val::object(new_off)) };
                }
            }
        }
    }

    /// Copies the block at `from_offset` into `to_heap` if it hasn't been
    /// copied yet, and returns its to-heap offset either way.
    fn move_block(
        from_heap: &Heap,
        to_heap: &mut Heap,
        from_offset: u32,
        queue: &mut VecDeque<Block>,
        dicts: &mut Vec<Block>,
    ) -> u32 {
        let from_block = from_heap.block_at(from_offset);
        if let Some(already) = from_block.forwarding_address() {
            return already;
        }

        let ty = from_block.type_();
        let data_size = from_block.data_size();
        let new_block = to_heap
            .alloc_block(data_size, ty)
            .unwrap_or_else(|| panic!("gc: to-heap ran out of space copying a {data_size}-byte {ty} block"));
        unsafe {
            new_block.data_mut().copy_from_slice(from_block.data());
        }
        if ty.holds_vals() {
            queue.push_back(new_block);
            if ty == Type::Dict {
                dicts.push(new_block);
            }
        }

        let new_offset = to_heap.offset_of(new_block);
        // SAFETY: total_size() always reserves at least 4 bytes, enough
        // for a forwarding pointer, even for an empty-payload block.
        unsafe { from_block.set_forwarding_address(new_offset) };
        new_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;
    use crate::object::{Array, HeapString};
    use crate::value::Value;

    #[test]
    fn diagnostics_counts_blocks_by_type() {
        let mut heap = Heap::new(10_000).unwrap();
        HeapString::new(&mut heap, "a").unwrap();
        HeapString::new(&mut heap, "b").unwrap();
        Array::new(&mut heap, 3).unwrap();

        let report = GarbageCollector::diagnostics(&heap);
        assert_eq!(report.get(&Type::String).unwrap().0, 2);
        assert_eq!(report.get(&Type::Array).unwrap().0, 1);
    }

    #[test]
    fn reclaims_unreachable_blocks() {
        let mut heap = Heap::new(100_000).unwrap();
        let root = Array::new(&mut heap, 1).unwrap();
        heap.set_root(Val::object(heap.offset_of(root.block())));
        let reachable = HeapString::new(&mut heap, "keep me").unwrap();
        root.set(0, Val::object(heap.offset_of(reachable.block())));
        let _garbage = HeapString::new(&mut heap, "garbage").unwrap();

        let used_before = heap.used();
        GarbageCollector::run(&mut heap);
        assert!(heap.used() < used_before);

        let mut seen = 0;
        heap.visit_all(|_| seen += 1);
        assert_eq!(seen, 2); // root array + the reachable string
    }

    #[test]
    fn preserves_handles_across_relocation() {
        let mut heap = Heap::new(100_000).unwrap();
        let s = HeapString::new(&mut heap, "Cowabunga!").unwrap();
        let handle = Handle::new(&heap, Value::from_block(&heap, s.block()));

        GarbageCollector::run(&mut heap);

        let value = handle.value(&heap);
        let s2 = value.as_kind::<HeapString>().unwrap();
        assert_eq!(s2.as_str(), "Cowabunga!");
    }

    #[test]
    fn resorts_dicts_after_relocation() {
        let mut heap = Heap::new(100_000).unwrap();
        let dict = Dict::new(&mut heap, 5).unwrap();
        heap.set_root(Val::object(heap.offset_of(dict.block())));
        for i in 0..5 {
            let s = HeapString::new(&mut heap, &format!("k{i}")).unwrap();
            dict.set(Val::object(heap.offset_of(s.block())), Val::int(i));
        }
        GarbageCollector::run(&mut heap);

        let dict = Dict::from_block(heap.block_at(heap.root_offset()));
        let keys: Vec<u32> = dict.iter().map(|(k, _)| k.as_offset()).collect();
        let mut sorted = keys.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(keys, sorted);
        assert_eq!(dict.count(), 5);
    }

    #[test]
    fn cyclic_references_collapse_to_one_relocation() {
        let mut heap = Heap::new(100_000).unwrap();
        let a = Array::new(&mut heap, 1).unwrap();
        let b = Array::new(&mut heap, 1).unwrap();
        a.set(0, Val::object(heap.offset_of(b.block())));
        b.set(0, Val::object(heap.offset_of(a.block())));
        heap.set_root(Val::object(heap.offset_of(a.block())));

        GarbageCollector::run(&mut heap);

        let mut seen = 0;
        heap.visit_all(|_| seen += 1);
        assert_eq!(seen, 2);
    }

    #[test]
    fn used_after_gc_matches_the_surviving_blocks_footprint() {
        let mut heap = Heap::new(100_000).unwrap();
        let root = Array::new(&mut heap, 10).unwrap();
        heap.set_root(Val::object(heap.offset_of(root.block())));
        for i in 0..10u32 {
            let blob = crate::object::Blob::new(&mut heap, &[i as u8; 64]).unwrap();
            root.set(i, Val::object(heap.offset_of(blob.block())));
        }
        for i in 0..7u32 {
            root.set(i, Val::NULL);
        }

        GarbageCollector::run(&mut heap);

        let survivor_footprint =
            Block::total_size(64) * 3 + Block::total_size(10 * 4) + crate::heap::HEADER_SIZE as u32;
        assert_eq!(heap.used() as u32, survivor_footprint);
    }

    #[test]
    fn array_elements_stay_identity_equal_index_by_index_after_gc() {
        let mut heap = Heap::new(100_000).unwrap();
        let root = Array::new(&mut heap, 3).unwrap();
        heap.set_root(Val::object(heap.offset_of(root.block())));
        let strings: Vec<HeapString> = (0..3).map(|i| HeapString::new(&mut heap, &format!("s{i}")).unwrap()).collect();
        for (i, s) in strings.iter().enumerate() {
            root.set(i as u32, Val::object(heap.offset_of(s.block())));
        }
        let handle = Handle::new(&heap, Value::from_block(&heap, root.block()));

        GarbageCollector::run(&mut heap);

        let root_after = handle.value(&heap).as_kind::<Array>().unwrap();
        for i in 0..3u32 {
            let v = Value::new(root_after.get(i), &heap).as_kind::<HeapString>().unwrap();
            assert_eq!(v.as_str(), format!("s{i}"));
        }
        assert_ne!(root_after.get(0), root_after.get(1));
    }
}
