//! Blob: opaque bytes, no interpretation imposed by the core.

use super::ObjectKind;
use crate::block::{Block, Type};
use crate::heap::Heap;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Blob(Block);

impl Blob {
    pub fn new(heap: &mut Heap, bytes: &[u8]) -> Option<Blob> {
        let block = heap.alloc_block_with(bytes.len() as u32, Type::Blob, bytes)?;
        Some(Blob(block))
    }

    /// Allocates `size` zeroed bytes, for callers that want to fill the
    /// payload in place after allocation.
    pub fn new_zeroed(heap: &mut Heap, size: u32) -> Option<Blob> {
        let block = heap.alloc_block(size, Type::Blob)?;
        Some(Blob(block))
    }

    pub fn len(&self) -> u32 {
        self.0.data_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        unsafe { self.0.data() }
    }

    pub fn bytes_mut(&self) -> &mut [u8] {
        unsafe { self.0.data_mut() }
    }
}

impl ObjectKind for Blob {
    const TYPE: Type = Type::Blob;

    fn from_block(block: Block) -> Self {
        Blob(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl std::fmt::Debug for Blob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Blob({} bytes)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_arbitrary_bytes() {
        let mut heap = Heap::new(10_000).unwrap();
        let blob = Blob::new(&mut heap, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(blob.bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }
}
