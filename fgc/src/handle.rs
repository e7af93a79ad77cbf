//! External roots that survive garbage collection.
//!
//! A plain [`Value`] is only safe to use between allocations: once the GC
//! runs, any `Value` not reachable from the heap's root or symbol table is
//! free to have moved or been reclaimed. A [`Handle`] is how a mutator
//! tells the GC "keep this alive and update it if it moves."
//!
//! Registering the address of a stack-resident root directly with the heap
//! and patching it in place during collection would be unsound in Rust: a
//! `Handle` can be freely moved (`Vec::push`, returned from a function,
//! `mem::swap`'d) and the GC has no way to chase a moving Rust value.
//!
//! Instead a [`Handle`] holds a clone of the heap's shared slot table plus
//! a stable slot index; the *value* lives in the slot table, not in the
//! `Handle` itself, so moving a `Handle` around is just moving an index.
//! `Drop` unregisters the slot, giving it the same scoped-lifetime feel as
//! an RAII guard.

use crate::heap::Heap;
use crate::val::Val;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub type HandleId = u32;

/// The slot table shared between every [`Handle`] and the [`Heap`] that
/// issued them. Slots are reused (never shrunk) via a free list so that
/// long-running mutators don't grow this table without bound.
pub struct HandleSlots {
    slots: Vec<Option<Val>>,
    free: Vec<HandleId>,
}

pub(crate) type SharedHandleSlots = Rc<RefCell<HandleSlots>>;

impl HandleSlots {
    pub(crate) fn new() -> HandleSlots {
        HandleSlots { slots: Vec::new(), free: Vec::new() }
    }

    pub(crate) fn insert(&mut self, val: Val) -> HandleId {
        if let Some(id) = self.free.pop() {
            self.slots[id as usize] = Some(val);
            id
        } else {
            self.slots.push(Some(val));
            (self.slots.len() - 1) as HandleId
        }
    }

    pub(crate) fn get(&self, id: HandleId) -> Val {
        self.slots[id as usize].expect("handle slot read after release")
    }

    pub(crate) fn set(&mut self, id: HandleId, val: Val) {
        self.slots[id as usize] = Some(val);
    }

    pub(crate) fn release(&mut self, id: HandleId) {
        self.slots[id as usize] = None;
        self.free.push(id);
    }

    /// Every still-registered `(id, val)` pair, in slot order. Used by the
    /// GC to build its root set and to patch values after relocation.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (HandleId, Val)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, v)| v.map(|v| (i as HandleId, v)))
    }
}

/// A GC-safe handle to a [`Value`] living in a particular [`Heap`].
///
/// As long as a `Handle` is alive, the GC keeps its referent reachable
/// and rewrites the handle's slot to the relocated address. Dropping the
/// handle releases the slot; it does not affect the heap otherwise (the
/// value may still be reachable through other roots).
pub struct Handle {
    slots: SharedHandleSlots,
    id: HandleId,
}

impl Handle {
    /// Registers `value` (which must belong to `heap`) as an external root.
    pub fn new(heap: &Heap, value: Value) -> Handle {
        let slots = heap.handle_table();
        let id = slots.borrow_mut().insert(value.val());
        Handle { slots, id }
    }

    pub fn val(&self) -> Val {
        self.slots.borrow().get(self.id)
    }

    pub fn value(&self, heap: &Heap) -> Value {
        Value::new(self.val(), heap)
    }

    /// Repoints this handle at a new value without re-registering it.
    pub fn set(&self, value: Value) {
        self.slots.borrow_mut().set(self.id, value.val());
    }
}

impl Clone for Handle {
    /// Registers a second, independent slot pointing at the same current
    /// value; the two handles do not stay in sync afterwards.
    fn clone(&self) -> Handle {
        let val = self.val();
        let id = self.slots.borrow_mut().insert(val);
        Handle { slots: self.slots.clone(), id }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.slots.borrow_mut().release(self.id);
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle(#{}, {:?})", self.id, self.val())
    }
}
