//! End-to-end scenarios exercising the whole stack (heap, values, handles,
//! symbol table, GC) together, the way a single mutator session would use
//! them. Unit tests next to each module cover individual operations; these
//! cover the literal create/save/reopen/collect life cycle.

use fgc::{Array, BigInt, Blob, GarbageCollector, Handle, Heap, HeapOptions, HeapString, ObjectKind, Val, Value};

#[test]
fn create_save_reopen_round_trips_an_array_of_mixed_values() {
    let mut heap = Heap::new(100_000).unwrap();
    let root = Array::new(&mut heap, 4).unwrap();
    heap.set_root(Val::object(heap.offset_of(root.block())));

    root.set(0, Val::int(1234));
    root.set(1, Val::int(-4567));
    let cow = HeapString::new(&mut heap, "Cowabunga!").unwrap();
    let cow_val = Val::object(heap.offset_of(cow.block()));
    root.set(2, cow_val);
    root.set(3, cow_val);
    let _garbage = HeapString::new(&mut heap, "Garbage!").unwrap();

    let bytes = heap.to_bytes().to_vec();
    let reopened = Heap::existing(bytes, 100_000);
    assert!(reopened.valid());

    let root = reopened.root_value().as_kind::<Array>().unwrap();
    assert_eq!(root.len(), 4);
    assert_eq!(root.get(0), Val::int(1234));
    assert_eq!(root.get(1), Val::int(-4567));
    assert_eq!(root.get(2), root.get(3));
    let s2 = Value::new(root.get(2), &reopened).as_kind::<HeapString>().unwrap();
    assert_eq!(s2.as_str(), "Cowabunga!");

    let mut blocks = 0;
    reopened.visit_all(|_| blocks += 1);
    assert_eq!(blocks, 3, "root array, one shared string, and the unreferenced garbage string");
}

#[test]
fn gc_reclaims_the_unreferenced_string() {
    let mut heap = Heap::new(100_000).unwrap();
    let root = Array::new(&mut heap, 1).unwrap();
    heap.set_root(Val::object(heap.offset_of(root.block())));
    let cow = HeapString::new(&mut heap, "Cowabunga!").unwrap();
    root.set(0, Val::object(heap.offset_of(cow.block())));
    let _garbage = HeapString::new(&mut heap, "Garbage!").unwrap();

    let used_before = heap.used();
    GarbageCollector::run(&mut heap);
    assert!(heap.used() < used_before);

    let mut blocks = 0;
    heap.visit_all(|_| blocks += 1);
    assert_eq!(blocks, 2, "root array and the reachable string only");
}

#[test]
fn gc_preserves_handles_across_relocation() {
    let mut heap = Heap::new(100_000).unwrap();
    let root = Array::new(&mut heap, 1).unwrap();
    heap.set_root(Val::object(heap.offset_of(root.block())));
    let cow = HeapString::new(&mut heap, "Cowabunga!").unwrap();
    root.set(0, Val::object(heap.offset_of(cow.block())));

    let root_handle = Handle::new(&heap, Value::from_block(&heap, root.block()));
    let string_handle = Handle::new(&heap, Value::from_block(&heap, cow.block()));

    GarbageCollector::run(&mut heap);

    let root_after = root_handle.value(&heap).as_kind::<Array>().unwrap();
    let string_after = string_handle.value(&heap).as_kind::<HeapString>().unwrap();
    assert_eq!(string_after.as_str(), "Cowabunga!");
    assert_eq!(root_after.get(0), string_handle.val(), "array's slot follows the same relocation as the handle");
}

#[test]
fn symbol_table_grows_and_stays_idempotent_across_a_hundred_inserts() {
    let mut heap = Heap::new(10_000).unwrap();
    let foo = fgc::SymbolTable::create(&mut heap, "foo").unwrap();
    let bar = fgc::SymbolTable::create(&mut heap, "bar").unwrap();
    assert_eq!(fgc::SymbolTable::find(&heap, "foo").unwrap().block(), foo.block());
    assert_eq!(fgc::SymbolTable::find(&heap, "bar").unwrap().block(), bar.block());

    for i in 0..100 {
        let name = format!("Symbol #{i}");
        let created = fgc::SymbolTable::create(&mut heap, &name).unwrap();
        let found = fgc::SymbolTable::find(&heap, &name).unwrap();
        assert_eq!(created.block(), found.block());
    }

    assert_eq!(fgc::SymbolTable::count(&heap), 102);

    let bytes = heap.to_bytes().to_vec();
    let reopened = Heap::existing(bytes, 10_000);
    assert!(reopened.valid());
    assert_eq!(fgc::SymbolTable::find(&reopened, "bar").unwrap().as_str(), "bar");
}

#[test]
fn dict_entries_stay_sorted_and_retrievable_after_gc() {
    let mut heap = Heap::new(100_000).unwrap();
    let dict = fgc::Dict::new(&mut heap, 5).unwrap();
    heap.set_root(Val::object(heap.offset_of(dict.block())));

    let mut expected = Vec::new();
    for i in 0..5 {
        let key = HeapString::new(&mut heap, &format!("k{i}")).unwrap();
        let key_val = Val::object(heap.offset_of(key.block()));
        dict.set(key_val, Val::int(i * 10));
        expected.push(i * 10);
    }

    GarbageCollector::run(&mut heap);

    let dict = heap.root_value().as_kind::<fgc::Dict>().unwrap();
    assert_eq!(dict.count(), 5);
    let values: Vec<i32> = dict.iter().map(|(_, v)| v.as_int()).collect();
    let mut sorted_expected = expected.clone();
    sorted_expected.sort_unstable();
    let mut sorted_actual = values.clone();
    sorted_actual.sort_unstable();
    assert_eq!(sorted_actual, sorted_expected);

    let keys: Vec<u32> = dict.iter().map(|(k, _)| k.raw()).collect();
    let mut descending = keys.clone();
    descending.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(keys, descending, "dict iterates in descending key order after relocation");
}

#[test]
fn allocation_failure_handler_runs_gc_and_retries_without_losing_live_blobs() {
    let mut heap = Heap::with_options(200_000, HeapOptions { verbose: false, ..HeapOptions::default() }).unwrap();
    let root = Array::new(&mut heap, 500).unwrap();
    heap.set_root(Val::object(heap.offset_of(root.block())));
    heap.set_alloc_failure_handler(|h, _needed| {
        GarbageCollector::run(h);
        true
    });

    for i in 0..500u32 {
        loop {
            if let Some(blob) = Blob::new(&mut heap, &[i as u8; 1000]) {
                let root = heap.root_value().as_kind::<Array>().unwrap();
                root.set(i, Val::object(heap.offset_of(blob.block())));
                break;
            }
        }
        if i >= 50 && i % 50 == 0 {
            let root = heap.root_value().as_kind::<Array>().unwrap();
            root.set(i - 50, Val::NULLISH);
        }
    }

    assert!(heap.used() < heap.capacity());
    let root = heap.root_value().as_kind::<Array>().unwrap();
    for i in 0..500u32 {
        let v = root.get(i);
        assert!(v.is_object() || v.is_nullish(), "slot {i} lost its value: {v:?}");
    }
}

#[test]
fn bigint_promotion_round_trips_through_json() {
    let mut heap = Heap::new(10_000).unwrap();
    let big = BigInt::val_for(&mut heap, i64::MAX).unwrap();
    assert!(big.is_object());
    let value = Value::new(big, &heap);
    let json = fgc::to_json(&heap, value).unwrap();
    assert_eq!(json, i64::MAX.to_string());
}
