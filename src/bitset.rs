/*!
Minimal typed-index bitset used as visited/marker sets for vertices and
edges. Wraps [`fixedbitset::FixedBitSet`] behind the small `new`/`set_bit`/
`clear_bit`/`get_bit` surface the rest of the crate relies on.
*/

use fixedbitset::FixedBitSet;
use std::marker::PhantomData;

/// Types usable as indices into a [`BitSetImpl`].
pub trait BitIndex: Copy {
    fn as_index(self) -> usize;
}

impl BitIndex for u32 {
    fn as_index(self) -> usize {
        self as usize
    }
}

/// A fixed-size bitset addressed by a typed index `T`.
#[derive(Debug, Clone)]
pub struct BitSetImpl<T> {
    bits: FixedBitSet,
    _marker: PhantomData<fn(T)>,
}

impl<T: BitIndex> BitSetImpl<T> {
    pub fn new(len: T) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(len.as_index()),
            _marker: PhantomData,
        }
    }

    pub fn set_bit(&mut self, idx: T) {
        self.bits.insert(idx.as_index());
    }

    pub fn clear_bit(&mut self, idx: T) {
        self.bits.set(idx.as_index(), false);
    }

    pub fn get_bit(&self, idx: T) -> bool {
        self.bits.contains(idx.as_index())
    }
}
