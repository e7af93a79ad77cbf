//! String: a UTF-8 byte sequence, not zero-terminated.

use super::{utf8_unchecked, ObjectKind};
use crate::block::{Block, Type};
use crate::heap::Heap;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HeapString(Block);

impl HeapString {
    /// Copies `s`'s bytes into a freshly-allocated String block.
    pub fn new(heap: &mut Heap, s: &str) -> Option<HeapString> {
        let block = heap.alloc_block_with(s.len() as u32, Type::String, s.as_bytes())?;
        Some(HeapString(block))
    }

    pub fn len(&self) -> u32 {
        self.0.data_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_str(&self) -> &str {
        utf8_unchecked(unsafe { self.0.data() })
    }
}

impl ObjectKind for HeapString {
    const TYPE: Type = Type::String;

    fn from_block(block: Block) -> Self {
        HeapString(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl std::fmt::Debug for HeapString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}
