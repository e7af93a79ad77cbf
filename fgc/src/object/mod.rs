//! Concrete object kinds layered on top of [`Block`].
//!
//! Each kind here is a thin, `Copy`-able wrapper around a [`Block`] whose
//! payload it knows how to interpret; none of them owns anything beyond
//! the block pointer itself, mirroring [`Block`]'s own non-owning design.
//! Mutating accessors write straight through the block's payload bytes.

mod array;
mod bigint;
mod blob;
mod dict;
mod float;
mod string;
mod symbol;
mod vector;

pub use array::Array;
pub use bigint::BigInt;
pub use blob::Blob;
pub use dict::Dict;
pub use float::Float;
pub use string::HeapString;
pub use symbol::Symbol;
pub use vector::Vector;

use crate::block::{Block, Type};
use crate::heap::Heap;
use crate::slice::HeapSlice;
use crate::val::Val;

/// Common interface for every concrete object kind: the block type it's
/// tagged with, and how to recover the typed wrapper from a bare `Block`.
///
/// Implemented by the eight kinds above; used by [`crate::value::Value::is`]
/// and [`crate::value::Value::as_kind`] to downcast.
pub trait ObjectKind: Copy {
    const TYPE: Type;

    /// Wraps `block` without checking its type; callers must have already
    /// confirmed `block.type_() == Self::TYPE`.
    fn from_block(block: Block) -> Self;

    fn block(&self) -> Block;
}

/// A container kind that can be reallocated at a larger capacity and have
/// its live entries carried over, backing [`Heap::grow`].
pub trait Growable: ObjectKind + Sized {
    /// This container's current capacity (its unit, not raw byte size).
    fn capacity(&self) -> u32;

    /// Allocates an empty container of `capacity`.
    fn allocate(heap: &mut Heap, capacity: u32) -> Option<Self>;

    /// Copies every live entry of `self` into the (empty, larger) `grown`
    /// container.
    fn copy_into(&self, grown: &Self);
}

pub(crate) fn utf8_unchecked(bytes: &[u8]) -> &str {
    // SAFETY: every String/Symbol block is written exclusively through
    // `HeapString::new`/`Symbol::new_unique`, both of which only ever copy
    // in bytes that already came from a Rust `&str`.
    unsafe { std::str::from_utf8_unchecked(bytes) }
}

/// Reinterprets a container block's payload as a slice of [`Val`]s.
///
/// # Safety
/// `block` must be one of the container types ([`Type::holds_vals`]).
pub(crate) unsafe fn vals_of(block: Block) -> HeapSlice<Val> {
    debug_assert!(block.type_().holds_vals());
    HeapSlice::new(block.data_ptr(), block.data_size() / 4)
}
