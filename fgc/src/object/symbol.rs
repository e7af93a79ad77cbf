//! Symbol: same payload layout as String, but uniqued through the symbol
//! table. Only [`crate::symbol_table`] may mint a new Symbol block.

use super::{utf8_unchecked, ObjectKind};
use crate::block::{Block, Type};
use crate::heap::Heap;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Symbol(Block);

impl Symbol {
    /// Not exported: direct creation of a Symbol by a client is only
    /// permitted through the symbol table's `create` API.
    pub(crate) fn new_unique(heap: &mut Heap, s: &str) -> Option<Symbol> {
        let block = heap.alloc_block_with(s.len() as u32, Type::Symbol, s.as_bytes())?;
        Some(Symbol(block))
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

impl ObjectKind for Symbol {
    const TYPE: Type = Type::Symbol;

    fn from_block(block: Block) -> Self {
        Symbol(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl std::fmt::Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}
