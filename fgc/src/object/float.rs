//! Float: four or eight bytes of IEEE-754, chosen by whether the value
//! round-trips losslessly through `f32`.

use super::ObjectKind;
use crate::block::{Block, Type};
use crate::heap::Heap;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Float(Block);

impl Float {
    /// Stores `value` as 4 bytes if `value as f32 as f64 == value`,
    /// otherwise as the full 8 bytes.
    pub fn new(heap: &mut Heap, value: f64) -> Option<Float> {
        let as_single = value as f32;
        let block = if as_single as f64 == value {
            heap.alloc_block_with(4, Type::Float, &as_single.to_le_bytes())?
        } else {
            heap.alloc_block_with(8, Type::Float, &value.to_le_bytes())?
        };
        Some(Float(block))
    }

    pub fn is_single(&self) -> bool {
        self.0.data_size() == 4
    }

    pub fn value(&self) -> f64 {
        let data = unsafe { self.0.data() };
        match data.len() {
            4 => f32::from_le_bytes(data.try_into().unwrap()) as f64,
            8 => f64::from_le_bytes(data.try_into().unwrap()),
            n => unreachable!("Float block must hold 4 or 8 bytes, found {n}"),
        }
    }
}

impl ObjectKind for Float {
    const TYPE: Type = Type::Float;

    fn from_block(block: Block) -> Self {
        Float(block)
    }

    fn block(&self) -> Block {
        self.0
    }
}

impl std::fmt::Debug for Float {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_precision_values_stay_4_bytes() {
        let mut heap = Heap::new(10_000).unwrap();
        let f = Float::new(&mut heap, 1.5).unwrap();
        assert!(f.is_single());
        assert_eq!(f.value(), 1.5);
    }

    #[test]
    fn double_precision_values_use_8_bytes() {
        let mut heap = Heap::new(10_000).unwrap();
        let value = std::f64::consts::PI;
        let f = Float::new(&mut heap, value).unwrap();
        assert!(!f.is_single());
        assert_eq!(f.value(), value);
    }
}
