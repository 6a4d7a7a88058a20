//! Fixed-length list of bits that can only be set.

use std::mem;
use std::ops::Index;

/// A fixed-length list of bits backed by a `Vec<u64>`.
///
/// Bits start unset and, once set, stay set. The number of set bits is tracked on every write so
/// that the population count is available in constant time.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BitVec {
    blocks: Vec<u64>,
    len: usize,
    one_count: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u64>() * 8;

impl BitVec {
    fn get_block_count(len: usize) -> usize {
        (len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    pub fn new(len: usize) -> Self {
        BitVec {
            blocks: vec![0; Self::get_block_count(len)],
            len,
            one_count: 0,
        }
    }

    /// Sets the bit at `index` and returns `true` if it was previously unset.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize) -> bool {
        assert!(index < self.len);
        let block_index = index / BLOCK_BIT_COUNT;
        let mask = 1u64 << (index % BLOCK_BIT_COUNT);
        let was_unset = self.blocks[block_index] & mask == 0;
        if was_unset {
            self.blocks[block_index] |= mask;
            self.one_count += 1;
        }
        was_unset
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        if index >= self.len {
            return None;
        }
        let block = self.blocks[index / BLOCK_BIT_COUNT];
        Some((block >> (index % BLOCK_BIT_COUNT)) & 1 != 0)
    }

    /// Sets `self` to the union of `self` and `other`.
    ///
    /// # Panics
    ///
    /// Panics if the two `BitVec` are of different lengths.
    pub fn union(&mut self, other: &Self) {
        assert_eq!(self.len, other.len);
        for (x, y) in self.blocks.iter_mut().zip(&other.blocks) {
            *x |= *y;
        }
        // bits past `len` are never set, so whole-block popcounts are exact
        self.one_count = self
            .blocks
            .iter()
            .map(|block| block.count_ones() as usize)
            .sum();
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn count_ones(&self) -> usize {
        self.one_count
    }

    pub fn count_zeros(&self) -> usize {
        self.len - self.one_count
    }
}

static TRUE: bool = true;
static FALSE: bool = false;

impl Index<usize> for BitVec {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        match self.get(index) {
            Some(true) => &TRUE,
            Some(false) => &FALSE,
            None => panic!("index out of bounds: {} >= {}", index, self.len),
        }
    }
}
