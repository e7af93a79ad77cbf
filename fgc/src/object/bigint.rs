//! BigInt: an eight-byte two's-complement integer, for values outside the
//! small-int [`Val`](crate::val::Val) range.

use super::ObjectKind;
use crate::block::{Block, Type};
use crate::heap::Heap;
use crate::val::Val;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BigInt(Block);

impl BigInt {
    pub fn new(heap: &mut Heap, value: i64) -> Option<BigInt> {
        let block = heap.alloc_block_with(8, Type::BigInt, &value.to_le_bytes())?;
        Some(BigInt(block))
    }

    /// Builds whichever [`Val`] representation fits: a small-int `Val`
    /// when `value` is in range, otherwise an allocated BigInt block.
    pub fn val_for(heap: &mut Heap, value: i64) -> Option<Val> {
        if (Val::MIN_INT as i64..=Val::MAX_INT as i64).contains(&value) {
            Some(Val::int(value as i32))
        } else {
            let big = BigInt::new(heap, value)?;
            Some(Val::object(heap.offset_of(big.0)))
        }
    }

    pub fn value(&self) -> i64 {
        let data = unsafe { self.0.data() };
        i64::from_le_bytes(data.try_into().expect("BigInt block must hold exactly 8 bytes"))
    }
}

impl ObjectKind for BigInt {
    const TYPE: Type = Type::BigInt;

    fn from_block(block: Block) -> Self {
        BigInt(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl std::fmt::Debug for BigInt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}
