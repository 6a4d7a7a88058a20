use crate::bit_vec::BitVec;
use crate::error::{invalid_configuration, FilterError, Result};
use crate::hash::{Murmur3Hasher, SeededHasher};
use log::debug;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::cmp;
use std::f64::consts;

/// Sizing parameters of a [`BloomFilter`].
///
/// # Examples
///
/// ```
/// use membership_filters::bloom::BloomConfig;
///
/// let config = BloomConfig::from_capacity(8000, 1000).unwrap();
/// assert_eq!(config.num_bits, 8000);
/// assert_eq!(config.num_hashes, 5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
pub struct BloomConfig {
    /// Length of the bit array.
    pub num_bits: usize,
    /// Number of hash probes per element.
    pub num_hashes: usize,
}

impl BloomConfig {
    /// Constructs a configuration with `num_bits` bits and `num_hashes` probes.
    pub fn new(num_bits: usize, num_hashes: usize) -> Self {
        BloomConfig {
            num_bits,
            num_hashes,
        }
    }

    /// Constructs a configuration with `num_bits` bits sized for an expected `capacity` items.
    /// The number of probes is `max(1, floor(num_bits / capacity * ln 2))`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `num_bits` or `capacity` is 0.
    pub fn from_capacity(num_bits: usize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(invalid_configuration("bloom filter capacity must be positive"));
        }
        let bits_per_item = num_bits as f64 / capacity as f64;
        let num_hashes = cmp::max(1, (bits_per_item * consts::LN_2).floor() as usize);
        let config = BloomConfig::new(num_bits, num_hashes);
        config.validate()?;
        Ok(config)
    }

    /// Checks that both parameters are positive.
    pub fn validate(&self) -> Result<()> {
        if self.num_bits == 0 {
            return Err(invalid_configuration("bloom filter num_bits must be positive"));
        }
        if self.num_hashes == 0 {
            return Err(invalid_configuration("bloom filter num_hashes must be positive"));
        }
        if self.num_hashes > u32::max_value() as usize {
            return Err(invalid_configuration(format!(
                "bloom filter num_hashes must not exceed {}",
                u32::max_value(),
            )));
        }
        Ok(())
    }
}

/// A space-efficient probabilistic data structure to test for membership in a set.
///
/// At its core, a bloom filter is a bit array, initially all set to zero. `K` seeded hash
/// functions map each element to `K` bits in the bit array. An element definitely does not exist
/// in the bloom filter if any of the `K` bits are unset. An element is possibly in the set if all
/// of the `K` bits are set. Bits are never cleared, so a bloom filter never reports a false
/// negative.
///
/// # Examples
///
/// ```
/// use membership_filters::bloom::BloomFilter;
///
/// let mut filter = BloomFilter::new(1000, 3).unwrap();
///
/// assert!(!filter.contains("apple"));
/// filter.insert("apple");
/// assert!(filter.contains("apple"));
///
/// assert_eq!(filter.len(), 1);
/// assert_eq!(filter.bit_count(), 1000);
/// assert_eq!(filter.hasher_count(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilter<H = Murmur3Hasher> {
    bit_vec: BitVec,
    hasher: H,
    hasher_count: usize,
    inserted_count: usize,
}

impl BloomFilter {
    /// Constructs a new, empty `BloomFilter` with `num_bits` bits and `num_hashes` hash probes,
    /// hashing with MurmurHash3.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `num_bits` or `num_hashes` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(8000, 4).unwrap();
    /// assert!(BloomFilter::new(0, 4).is_err());
    /// ```
    pub fn new(num_bits: usize, num_hashes: usize) -> Result<Self> {
        Self::with_hasher(num_bits, num_hashes, Murmur3Hasher)
    }

    /// Constructs a new, empty `BloomFilter` from a configuration.
    pub fn from_config(config: &BloomConfig) -> Result<Self> {
        Self::with_hasher(config.num_bits, config.num_hashes, Murmur3Hasher)
    }
}

impl<H> BloomFilter<H>
where
    H: SeededHasher,
{
    /// Constructs a new, empty `BloomFilter` with `num_bits` bits, `num_hashes` hash probes, and a
    /// custom hasher.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    /// use membership_filters::hash::SipHasherBuilder;
    ///
    /// let filter = BloomFilter::with_hasher(100, 7, SipHasherBuilder::from_seed(0, 0)).unwrap();
    /// ```
    pub fn with_hasher(num_bits: usize, num_hashes: usize, hasher: H) -> Result<Self> {
        BloomConfig::new(num_bits, num_hashes).validate()?;
        debug!(
            "constructing bloom filter with {} bits and {} hashes",
            num_bits, num_hashes
        );
        Ok(BloomFilter {
            bit_vec: BitVec::new(num_bits),
            hasher,
            hasher_count: num_hashes,
            inserted_count: 0,
        })
    }

    #[inline]
    fn get_offset(&self, element: &[u8], seed: u32) -> usize {
        (self.hasher.hash(element, seed) % self.bit_vec.len() as u64) as usize
    }

    /// Inserts an element into the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    ///
    /// filter.insert("foo");
    /// filter.insert(&b"\x00\x01"[..]);
    /// ```
    pub fn insert<E>(&mut self, element: &E)
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let element = element.as_ref();
        for seed in 0..self.hasher_count as u32 {
            let offset = self.get_offset(element, seed);
            self.bit_vec.set(offset);
        }
        self.inserted_count += 1;
    }

    /// Checks if an element is possibly in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo");
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<E>(&self, element: &E) -> bool
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let element = element.as_ref();
        (0..self.hasher_count as u32).all(|seed| self.bit_vec[self.get_offset(element, seed)])
    }

    /// Sets `self` to the union of `self` and `other`. Afterwards `self` reports every element
    /// that either filter reported.
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleFilters` if the filters differ in bit count, hash count, or hasher.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let mut filter_1 = BloomFilter::new(100, 3).unwrap();
    /// let mut filter_2 = BloomFilter::new(100, 3).unwrap();
    /// filter_1.insert("foo");
    /// filter_2.insert("bar");
    ///
    /// filter_1.union(&filter_2).unwrap();
    /// assert!(filter_1.contains("foo"));
    /// assert!(filter_1.contains("bar"));
    /// ```
    pub fn union(&mut self, other: &Self) -> Result<()>
    where
        H: PartialEq,
    {
        if self.bit_count() != other.bit_count() || self.hasher_count != other.hasher_count {
            return Err(FilterError::IncompatibleFilters(format!(
                "cannot union a bloom filter of {} bits and {} hashes with one of {} bits and {} \
                 hashes",
                self.bit_count(),
                self.hasher_count,
                other.bit_count(),
                other.hasher_count,
            )));
        }
        if self.hasher != other.hasher {
            return Err(FilterError::IncompatibleFilters(
                "cannot union bloom filters built with different hashers".to_string(),
            ));
        }
        self.bit_vec.union(&other.bit_vec);
        self.inserted_count += other.inserted_count;
        Ok(())
    }

    /// Returns the number of elements inserted into the bloom filter, counting repeats.
    pub fn len(&self) -> usize {
        self.inserted_count
    }

    /// Returns `true` if nothing has been inserted into the bloom filter.
    pub fn is_empty(&self) -> bool {
        self.inserted_count == 0
    }

    /// Returns the number of bits in the bloom filter.
    pub fn bit_count(&self) -> usize {
        self.bit_vec.len()
    }

    /// Returns the number of hash functions used by the bloom filter.
    pub fn hasher_count(&self) -> usize {
        self.hasher_count
    }

    /// Returns the number of elements for which the bloom filter's hash count is optimal,
    /// `max(1, floor(bit_count * ln 2 / hasher_count))`.
    pub fn capacity(&self) -> usize {
        let capacity = self.bit_count() as f64 * consts::LN_2 / self.hasher_count as f64;
        cmp::max(1, capacity.floor() as usize)
    }

    /// Returns the number of bits allocated per element at [`capacity`](BloomFilter::capacity).
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let filter = BloomFilter::new(8000, 4).unwrap();
    ///
    /// assert_eq!(filter.capacity(), 1386);
    /// assert!((filter.bits_per_item() - 8000.0 / 1386.0).abs() < 1e-9);
    /// ```
    pub fn bits_per_item(&self) -> f64 {
        self.bit_count() as f64 / self.capacity() as f64
    }

    /// Returns the number of set bits in the bloom filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100, 3).unwrap();
    /// filter.insert("foo");
    ///
    /// assert!(filter.count_ones() >= 1 && filter.count_ones() <= 3);
    /// ```
    pub fn count_ones(&self) -> usize {
        self.bit_vec.count_ones()
    }

    /// Returns the number of unset bits in the bloom filter.
    pub fn count_zeros(&self) -> usize {
        self.bit_vec.count_zeros()
    }

    /// Returns the estimated false positive probability of the bloom filter. This value will
    /// increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(1000, 3).unwrap();
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo");
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// assert!(filter.estimated_fpp() < 0.01);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let single_fpp = self.bit_vec.count_ones() as f64 / self.bit_vec.len() as f64;
        single_fpp.powi(self.hasher_count as i32)
    }

    /// Returns a reference to the bloom filter's hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}
