//! Common interface over the membership filters.

use crate::bloom::BloomFilter;
use crate::cuckoo::CuckooFilter;
use crate::hash::SeededHasher;
use crate::quotient::QuotientFilter;
use rand::Rng;

/// An approximate set-membership filter over byte-string elements.
///
/// Each filter keeps its own `insert` signature; this trait folds their outcomes into a single
/// `bool` so that callers can drive any filter generically.
pub trait MembershipFilter {
    /// Inserts an element, returning `false` if the filter rejected it for lack of space.
    fn try_insert(&mut self, element: &[u8]) -> bool;

    /// Checks if an element is possibly in the filter. `false` means definitely absent.
    fn contains(&self, element: &[u8]) -> bool;

    /// Returns the number of successfully inserted elements.
    fn len(&self) -> usize;

    /// Returns `true` if no element has been inserted.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the estimated false positive probability given the current load.
    fn estimated_fpp(&self) -> f64;

    /// Returns the number of bits allocated per element the filter is sized to hold.
    fn bits_per_item(&self) -> f64;
}

impl<H> MembershipFilter for BloomFilter<H>
where
    H: SeededHasher,
{
    fn try_insert(&mut self, element: &[u8]) -> bool {
        self.insert(element);
        true
    }

    fn contains(&self, element: &[u8]) -> bool {
        BloomFilter::contains(self, element)
    }

    fn len(&self) -> usize {
        BloomFilter::len(self)
    }

    fn estimated_fpp(&self) -> f64 {
        BloomFilter::estimated_fpp(self)
    }

    fn bits_per_item(&self) -> f64 {
        BloomFilter::bits_per_item(self)
    }
}

impl<H, R> MembershipFilter for CuckooFilter<H, R>
where
    H: SeededHasher,
    R: Rng,
{
    fn try_insert(&mut self, element: &[u8]) -> bool {
        self.insert(element)
    }

    fn contains(&self, element: &[u8]) -> bool {
        CuckooFilter::contains(self, element)
    }

    fn len(&self) -> usize {
        CuckooFilter::len(self)
    }

    fn estimated_fpp(&self) -> f64 {
        CuckooFilter::estimated_fpp(self)
    }

    fn bits_per_item(&self) -> f64 {
        CuckooFilter::bits_per_item(self)
    }
}

impl<H> MembershipFilter for QuotientFilter<H>
where
    H: SeededHasher,
{
    fn try_insert(&mut self, element: &[u8]) -> bool {
        self.insert(element).is_ok()
    }

    fn contains(&self, element: &[u8]) -> bool {
        QuotientFilter::contains(self, element)
    }

    fn len(&self) -> usize {
        QuotientFilter::len(self)
    }

    fn estimated_fpp(&self) -> f64 {
        QuotientFilter::estimated_fpp(self)
    }

    fn bits_per_item(&self) -> f64 {
        QuotientFilter::bits_per_item(self)
    }
}
