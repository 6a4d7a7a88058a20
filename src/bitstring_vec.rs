//! Fixed-length list of packed bitstrings.

use std::mem;

/// A fixed-length list of equal-width bitstrings packed into a `Vec<u64>`.
///
/// A bitstring of all zeros is treated as empty; `occupied_len` counts the non-zero entries.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct BitstringVec {
    blocks: Vec<u64>,
    bit_count: usize,
    occupied_len: usize,
    len: usize,
}

const BLOCK_BIT_COUNT: usize = mem::size_of::<u64>() * 8;

impl BitstringVec {
    #[inline]
    fn get_block_count(bit_count: usize, len: usize) -> usize {
        (bit_count * len + BLOCK_BIT_COUNT - 1) / BLOCK_BIT_COUNT
    }

    #[inline]
    fn get_mask(size: usize) -> u64 {
        if size == BLOCK_BIT_COUNT {
            !0
        } else {
            (1u64 << size) - 1
        }
    }

    pub fn new(bit_count: usize, len: usize) -> Self {
        assert!(bit_count > 0 && bit_count <= BLOCK_BIT_COUNT);
        BitstringVec {
            blocks: vec![0; Self::get_block_count(bit_count, len)],
            bit_count,
            occupied_len: 0,
            len,
        }
    }

    /// Sets the bitstring at `index`, returning the bitstring that was previously stored there.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds or `bitstring` is wider than `bit_count` bits.
    pub fn set(&mut self, index: usize, bitstring: u64) -> u64 {
        assert!(index < self.len);
        assert_eq!(bitstring & !Self::get_mask(self.bit_count), 0);
        let prev = self.get(index);
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let bit_index = bit_offset % BLOCK_BIT_COUNT;
        let bits_left = self.bit_count as isize - (BLOCK_BIT_COUNT - bit_index) as isize;
        self.blocks[block_index] &= !(Self::get_mask(self.bit_count) << bit_index);
        self.blocks[block_index] |= bitstring << bit_index;
        if bits_left > 0 {
            let offset = self.bit_count - bits_left as usize;
            self.blocks[block_index + 1] &= !Self::get_mask(bits_left as usize);
            self.blocks[block_index + 1] |= bitstring >> offset;
        }

        match (prev == 0, bitstring == 0) {
            (true, false) => self.occupied_len += 1,
            (false, true) => self.occupied_len -= 1,
            _ => {}
        }
        prev
    }

    pub fn get(&self, index: usize) -> u64 {
        assert!(index < self.len);
        let bit_offset = index * self.bit_count;
        let block_index = bit_offset / BLOCK_BIT_COUNT;
        let bit_index = bit_offset % BLOCK_BIT_COUNT;
        let bits_left = self.bit_count as isize - (BLOCK_BIT_COUNT - bit_index) as isize;
        let mut bitstring =
            (self.blocks[block_index] >> bit_index) & Self::get_mask(self.bit_count);
        if bits_left > 0 {
            let offset = self.bit_count - bits_left as usize;
            bitstring |=
                (self.blocks[block_index + 1] & Self::get_mask(bits_left as usize)) << offset;
        }
        bitstring
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    pub fn occupied_len(&self) -> usize {
        self.occupied_len
    }
}

#[cfg(test)]
mod tests {
    use super::BitstringVec;

    #[test]
    fn test_new() {
        let bv = BitstringVec::new(7, 10);
        assert_eq!(bv.len(), 10);
        assert_eq!(bv.bit_count(), 7);
        assert_eq!(bv.occupied_len(), 0);
        assert!((0..10).all(|index| bv.get(index) == 0));
    }

    #[test]
    fn test_set_across_block_boundary() {
        // entry 6 of a 12-bit vec spans bits 72..84, entry 5 spans 60..72
        let mut bv = BitstringVec::new(12, 8);
        assert_eq!(bv.set(5, 0xABC), 0);
        assert_eq!(bv.set(6, 0xFFF), 0);
        assert_eq!(bv.set(4, 0x001), 0);

        assert_eq!(bv.get(4), 0x001);
        assert_eq!(bv.get(5), 0xABC);
        assert_eq!(bv.get(6), 0xFFF);
        assert_eq!(bv.get(7), 0);
        assert_eq!(bv.occupied_len(), 3);
    }

    #[test]
    fn test_overwrite_updates_occupied_len() {
        let mut bv = BitstringVec::new(64, 3);
        bv.set(0, u64::max_value());
        assert_eq!(bv.set(0, 5), u64::max_value());
        assert_eq!(bv.occupied_len(), 1);
        assert_eq!(bv.set(0, 0), 5);
        assert_eq!(bv.occupied_len(), 0);
    }

    #[test]
    #[should_panic]
    fn test_set_too_wide() {
        let mut bv = BitstringVec::new(4, 3);
        bv.set(0, 0x10);
    }
}
