//! The thread-local "current heap" slot.
//!
//! `UsingHeap` / `Heap::current()`: at most one heap is "current" per
//! thread at a time, pushed and popped by a scoped
//! guard so that factory functions can be called without threading a
//! `&mut Heap` through every call site. This is pure ergonomics layered on
//! top of the core API -- everything in [`crate::heap`] also takes an
//! explicit heap reference.

use crate::heap::Heap;
use std::cell::RefCell;

thread_local! {
    static CURRENT: RefCell<Vec<*mut Heap>> = const { RefCell::new(Vec::new()) };
}

/// Pushes `heap` as the current heap for this thread while in scope;
/// restores the previously-current heap (if any) when dropped, on every
/// exit path including an unwinding panic.
pub struct UsingHeap {
    _no_send_sync: std::marker::PhantomData<*const ()>,
}

impl UsingHeap {
    pub fn new(heap: &mut Heap) -> UsingHeap {
        CURRENT.with(|c| c.borrow_mut().push(heap as *mut Heap));
        UsingHeap { _no_send_sync: std::marker::PhantomData }
    }
}

impl Drop for UsingHeap {
    fn drop(&mut self) {
        CURRENT.with(|c| {
            c.borrow_mut().pop();
        });
    }
}

/// The heap most recently pushed by a live [`UsingHeap`] guard on this
/// thread, if any.
///
/// # Safety
/// The returned pointer is valid only as long as the `UsingHeap` guard
/// that installed it (or an older one further down the stack) is still
/// alive, and only if no other code concurrently holds a conflicting
/// borrow of the same heap. Callers must not retain it past that scope.
pub unsafe fn current_heap() -> Option<*mut Heap> {
    CURRENT.with(|c| c.borrow().last().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::Heap;

    #[test]
    fn guard_pushes_and_pops() {
        assert!(unsafe { current_heap() }.is_none());
        let mut h = Heap::new(4096).unwrap();
        {
            let _g = UsingHeap::new(&mut h);
            assert!(unsafe { current_heap() }.is_some());
        }
        assert!(unsafe { current_heap() }.is_none());
    }

    #[test]
    fn nested_guards_restore_outer() {
        let mut h1 = Heap::new(4096).unwrap();
        let mut h2 = Heap::new(4096).unwrap();
        let g1 = UsingHeap::new(&mut h1);
        let outer = unsafe { current_heap() }.unwrap();
        {
            let _g2 = UsingHeap::new(&mut h2);
            let inner = unsafe { current_heap() }.unwrap();
            assert_ne!(outer, inner);
        }
        assert_eq!(unsafe { current_heap() }.unwrap(), outer);
        drop(g1);
    }
}
