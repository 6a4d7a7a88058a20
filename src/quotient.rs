//! Space-efficient probabilistic data structure to test for membership in a set.

use crate::error::{invalid_configuration, FilterError, Result};
use crate::hash::{Murmur3Hasher, SeededHasher};
use log::debug;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::fmt;

const SHIFTED_MASK: u8 = 0b001;
const CONTINUATION_MASK: u8 = 0b010;
const OCCUPIED_MASK: u8 = 0b100;

const QUOTIENT_SEED: u32 = 0;

// each slot is accounted as one 32-bit word of remainder and metadata
const SLOT_BIT_COUNT: usize = 32;

/// Sizing parameters of a [`QuotientFilter`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
pub struct QuotientConfig {
    /// Number of slots.
    pub size: usize,
}

impl QuotientConfig {
    /// Constructs a configuration with `size` slots.
    pub fn new(size: usize) -> Self {
        QuotientConfig { size }
    }

    /// Constructs a configuration with one slot per 32 bits of `total_bits`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `total_bits` is less than 32.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientConfig;
    ///
    /// let config = QuotientConfig::from_total_bits(8 * 1024 * 1024 * 8).unwrap();
    /// assert_eq!(config.size, 2_097_152);
    /// assert!(QuotientConfig::from_total_bits(31).is_err());
    /// ```
    pub fn from_total_bits(total_bits: usize) -> Result<Self> {
        let config = QuotientConfig::new(total_bits / SLOT_BIT_COUNT);
        config.validate()?;
        Ok(config)
    }

    /// Checks that the filter has at least one slot.
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(invalid_configuration("quotient filter size must be positive"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Slot {
    remainder: u64,
    // MMM
    // |||
    // ||- is_shifted: the remainder was probed away from its canonical slot
    // |-- is_continuation: the remainder extends a probe sequence started at an earlier slot
    // --- is_occupied: the slot holds a remainder
    metadata: u8,
}

impl Slot {
    #[inline]
    fn is_occupied(self) -> bool {
        self.metadata & OCCUPIED_MASK != 0
    }

    #[inline]
    fn is_continuation(self) -> bool {
        self.metadata & CONTINUATION_MASK != 0
    }

    #[inline]
    fn is_shifted(self) -> bool {
        self.metadata & SHIFTED_MASK != 0
    }
}

/// A space-efficient probabilistic data structure to test for membership in a set.
///
/// A quotient filter is a compact open-addressing hash table. Each element is hashed once and the
/// hash is split into a quotient (`hash % size`), which selects the element's canonical slot, and a
/// remainder (`hash / size`), which is what the slot stores. Together they reconstruct the full
/// hash, so no separate fingerprint table is needed.
///
/// When the canonical slot is taken, the remainder is stored in the next free slot, probing
/// forward and wrapping around the table, and the slot is flagged as shifted and as a
/// continuation. Every slot carries three bits of metadata: `is_occupied`, `is_continuation`,
/// and `is_shifted`.
///
/// Slots are not grouped into runs by quotient. A lookup stops at the first slot that is not a
/// continuation, so an element probed away from its canonical slot may be reported as absent.
///
/// # Examples
///
/// ```
/// use membership_filters::quotient::QuotientFilter;
///
/// let mut filter = QuotientFilter::new(16).unwrap();
///
/// assert!(!filter.contains("apple"));
/// filter.insert("apple").unwrap();
/// assert!(filter.contains("apple"));
///
/// assert_eq!(filter.len(), 1);
/// assert_eq!(filter.capacity(), 16);
/// ```
#[derive(Clone, PartialEq)]
pub struct QuotientFilter<H = Murmur3Hasher> {
    slots: Vec<Slot>,
    hasher: H,
    len: usize,
}

impl QuotientFilter {
    /// Constructs a new, empty `QuotientFilter` with `size` slots, hashing with MurmurHash3.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `size` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::new(1024).unwrap();
    /// assert!(QuotientFilter::new(0).is_err());
    /// ```
    pub fn new(size: usize) -> Result<Self> {
        Self::with_hasher(size, Murmur3Hasher)
    }

    /// Constructs a new, empty `QuotientFilter` from a configuration.
    pub fn from_config(config: &QuotientConfig) -> Result<Self> {
        Self::with_hasher(config.size, Murmur3Hasher)
    }
}

impl<H> QuotientFilter<H>
where
    H: SeededHasher,
{
    /// Constructs a new, empty `QuotientFilter` with `size` slots and a custom hasher.
    pub fn with_hasher(size: usize, hasher: H) -> Result<Self> {
        QuotientConfig::new(size).validate()?;
        debug!("constructing quotient filter with {} slots", size);
        Ok(QuotientFilter {
            slots: vec![Slot::default(); size],
            hasher,
            len: 0,
        })
    }

    fn get_quotient_and_remainder(&self, element: &[u8]) -> (usize, u64) {
        let hash = self.hasher.hash(element, QUOTIENT_SEED);
        let size = self.slots.len() as u64;
        ((hash % size) as usize, hash / size)
    }

    fn increment_index(&self, index: &mut usize) {
        if *index == self.capacity() - 1 {
            *index = 0;
        } else {
            *index += 1;
        }
    }

    /// Inserts an element into the quotient filter. Inserting an element twice stores it twice.
    ///
    /// # Errors
    ///
    /// Returns `FilterFull` if every slot is already occupied.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientFilter;
    /// use membership_filters::FilterError;
    ///
    /// let mut filter = QuotientFilter::new(1).unwrap();
    ///
    /// assert!(filter.insert("foo").is_ok());
    /// assert_eq!(filter.insert("bar"), Err(FilterError::FilterFull { capacity: 1 }));
    /// ```
    pub fn insert<E>(&mut self, element: &E) -> Result<()>
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let (quotient, remainder) = self.get_quotient_and_remainder(element.as_ref());

        // canonical slot is free
        if !self.slots[quotient].is_occupied() {
            self.slots[quotient] = Slot {
                remainder,
                metadata: OCCUPIED_MASK,
            };
            self.len += 1;
            return Ok(());
        }

        let mut index = quotient;
        loop {
            self.increment_index(&mut index);
            if index == quotient {
                debug!("quotient filter with {} slots is full", self.capacity());
                return Err(FilterError::FilterFull {
                    capacity: self.capacity(),
                });
            }
            if !self.slots[index].is_occupied() {
                break;
            }
        }

        // a probed slot is never the canonical slot, so it is always a continuation
        self.slots[index] = Slot {
            remainder,
            metadata: OCCUPIED_MASK | SHIFTED_MASK | CONTINUATION_MASK,
        };
        self.len += 1;
        Ok(())
    }

    /// Checks if an element is possibly in the quotient filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::new(16).unwrap();
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo").unwrap();
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<E>(&self, element: &E) -> bool
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let (quotient, remainder) = self.get_quotient_and_remainder(element.as_ref());
        let mut index = quotient;
        loop {
            let slot = self.slots[index];
            if !slot.is_occupied() {
                return false;
            }
            if slot.remainder == remainder {
                return true;
            }
            if !slot.is_continuation() {
                return false;
            }

            self.increment_index(&mut index);
            if index == quotient {
                return false;
            }
        }
    }

    /// Returns the number of elements inserted into the quotient filter.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the quotient filter is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots in the quotient filter.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of bits allocated to slots, at 32 bits per slot.
    pub fn bit_count(&self) -> usize {
        self.capacity() * SLOT_BIT_COUNT
    }

    /// Returns the number of bits allocated per slot.
    pub fn bits_per_item(&self) -> f64 {
        self.bit_count() as f64 / self.capacity() as f64
    }

    /// Returns the number of hash bits kept in each remainder: the hash width less the bits
    /// consumed by the quotient.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientFilter;
    ///
    /// let filter = QuotientFilter::new(256).unwrap();
    ///
    /// assert_eq!(filter.remainder_bits(), 24);
    /// ```
    pub fn remainder_bits(&self) -> u32 {
        let quotient_bits = (self.capacity() as f64).log2().floor() as u32;
        self.hasher.output_bits().saturating_sub(quotient_bits)
    }

    /// Returns the estimated false positive probability of the quotient filter. This value will
    /// increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::quotient::QuotientFilter;
    ///
    /// let mut filter = QuotientFilter::new(256).unwrap();
    /// assert!(filter.estimated_fpp() < 1e-15);
    ///
    /// filter.insert("foo").unwrap();
    /// assert!(filter.estimated_fpp() > 1e-15);
    /// assert!(filter.estimated_fpp() < 0.05);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let fill_ratio = self.len() as f64 / self.capacity() as f64;
        let remainder_count = 2.0f64.powf(f64::from(self.remainder_bits()));
        -(-fill_ratio / remainder_count).exp_m1()
    }

    /// Returns a reference to the quotient filter's hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

impl<H> fmt::Debug for QuotientFilter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, symbol: char| if set { symbol } else { '-' };
        for (index, slot) in self.slots.iter().enumerate() {
            write!(
                f,
                "{}|{}:{}{}{} ",
                index,
                slot.remainder,
                flag(slot.is_occupied(), 'o'),
                flag(slot.is_continuation(), 'c'),
                flag(slot.is_shifted(), 's'),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{QuotientConfig, QuotientFilter, OCCUPIED_MASK};
    use crate::error::FilterError;
    use crate::hash::tests::sip_hasher;
    use std::collections::HashSet;

    #[test]
    fn test_new() {
        let filter = QuotientFilter::new(16).unwrap();
        assert_eq!(filter.capacity(), 16);
        assert_eq!(filter.remainder_bits(), 28);
        assert!(filter.is_empty());

        let filter = QuotientFilter::from_config(&QuotientConfig::new(1000)).unwrap();
        assert_eq!(filter.capacity(), 1000);
        assert_eq!(filter.remainder_bits(), 23);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            QuotientFilter::new(0),
            Err(FilterError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            QuotientConfig::from_total_bits(0),
            Err(FilterError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_total_bits() {
        let config = QuotientConfig::from_total_bits(8 * 1024 * 1024 * 8).unwrap();
        assert_eq!(config.size, 2_097_152);

        // leftover bits that do not fill a slot are dropped
        let filter = QuotientFilter::from_config(&QuotientConfig::from_total_bits(100).unwrap())
            .unwrap();
        assert_eq!(filter.capacity(), 3);
        assert_eq!(filter.bit_count(), 96);
        assert!((filter.bits_per_item() - 32.0).abs() < std::f64::EPSILON);
    }

    #[test]
    fn test_fruit() {
        let mut filter = QuotientFilter::new(16).unwrap();
        filter.insert("apple").unwrap();
        filter.insert("banana").unwrap();
        filter.insert("cherry").unwrap();

        assert_eq!(filter.len(), 3);
        assert!(filter.contains("apple"));
        assert!(!filter.contains("grape"));
    }

    #[test]
    fn test_distinct_quotients_round_trip() {
        let mut filter = QuotientFilter::new(64).unwrap();
        let mut quotients = HashSet::new();
        let mut items = Vec::new();
        for index in 0..1000 {
            let item = format!("item{}", index);
            let (quotient, _) = filter.get_quotient_and_remainder(item.as_bytes());
            if quotients.insert(quotient) {
                items.push(item);
            }
            if items.len() == 32 {
                break;
            }
        }
        assert_eq!(items.len(), 32);

        for item in &items {
            filter.insert(item).unwrap();
        }
        assert!(items.iter().all(|item| filter.contains(item)));
        assert!(filter
            .slots
            .iter()
            .filter(|slot| slot.is_occupied())
            .all(|slot| !slot.is_shifted() && !slot.is_continuation()));
    }

    #[test]
    fn test_filter_full() {
        let mut filter = QuotientFilter::new(8).unwrap();
        for index in 0..8 {
            filter.insert(&format!("item{}", index)).unwrap();
        }
        assert_eq!(filter.len(), 8);
        assert!(filter.slots.iter().all(|slot| slot.is_occupied()));

        assert_eq!(
            filter.insert("item8"),
            Err(FilterError::FilterFull { capacity: 8 }),
        );
        assert_eq!(filter.len(), 8);
    }

    #[test]
    fn test_colliding_quotient_is_probed_forward() {
        let mut filter = QuotientFilter::with_hasher(4, sip_hasher()).unwrap();
        let candidates: Vec<(String, usize, u64)> = (0..1000)
            .map(|index| {
                let item = format!("item{}", index);
                let (quotient, remainder) = filter.get_quotient_and_remainder(item.as_bytes());
                (item, quotient, remainder)
            })
            .collect();
        let (first, quotient, first_remainder) = candidates[0].clone();
        let second = candidates[1..]
            .iter()
            .find(|(_, other_quotient, other_remainder)| {
                *other_quotient == quotient && *other_remainder != first_remainder
            })
            .map(|(item, ..)| item.clone())
            .unwrap();

        filter.insert(&first).unwrap();
        filter.insert(&second).unwrap();

        let probed = (quotient + 1) % 4;
        assert_eq!(filter.slots[quotient].metadata, OCCUPIED_MASK);
        assert!(filter.slots[probed].is_occupied());
        assert!(filter.slots[probed].is_shifted());
        assert!(filter.slots[probed].is_continuation());

        // the canonical slot is not a continuation, so the scan stops before the probed slot
        assert!(filter.contains(&first));
        assert!(!filter.contains(&second));
    }

    #[test]
    fn test_deterministic() {
        let mut filter_1 = QuotientFilter::new(128).unwrap();
        let mut filter_2 = QuotientFilter::new(128).unwrap();
        for index in 0..100 {
            let item = format!("key{}", index);
            filter_1.insert(&item).unwrap();
            filter_2.insert(&item).unwrap();
        }
        assert!(filter_1 == filter_2);
        for index in 0..500 {
            let item = format!("probe{}", index);
            assert_eq!(filter_1.contains(&item), filter_2.contains(&item));
        }
    }

    #[test]
    fn test_estimated_fpp() {
        let mut filter = QuotientFilter::with_hasher(256, sip_hasher()).unwrap();
        assert!(filter.estimated_fpp() < 1e-15);
        assert_eq!(filter.remainder_bits(), 56);

        for index in 0..128 {
            filter.insert(&format!("item{}", index)).unwrap();
        }
        assert!(filter.estimated_fpp() > 0.0);
        assert!(filter.estimated_fpp() < 1e-15);
    }
}
