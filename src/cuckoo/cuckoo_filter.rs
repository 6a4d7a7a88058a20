use crate::bitstring_vec::BitstringVec;
use crate::cuckoo::DEFAULT_MAX_KICKS;
use crate::error::{invalid_configuration, Result};
use crate::hash::{Murmur3Hasher, SeededHasher};
use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};
use std::fmt;

const PRIMARY_INDEX_SEED: u32 = 0;
const FINGERPRINT_SEED: u32 = 42;
const ALT_INDEX_SEED: u32 = 43;

/// Sizing parameters of a [`CuckooFilter`].
///
/// # Examples
///
/// ```
/// use membership_filters::cuckoo::CuckooConfig;
///
/// let config = CuckooConfig::new(1024, 4, 16).max_kicks(100);
/// assert_eq!(config.max_kicks, 100);
///
/// let config = CuckooConfig::from_total_bits(1 << 20, 4, 16).unwrap();
/// assert_eq!(config.num_buckets, 1 << 14);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
pub struct CuckooConfig {
    /// Number of buckets. Rounded up to the next power of two at construction.
    pub num_buckets: usize,
    /// Number of fingerprints each bucket holds.
    pub bucket_size: usize,
    /// Width of each fingerprint in bits.
    pub fingerprint_bits: usize,
    /// Maximum number of relocations attempted by a single insert.
    pub max_kicks: usize,
}

impl CuckooConfig {
    /// Constructs a configuration with the default of 500 maximum kicks.
    pub fn new(num_buckets: usize, bucket_size: usize, fingerprint_bits: usize) -> Self {
        CuckooConfig {
            num_buckets,
            bucket_size,
            fingerprint_bits,
            max_kicks: DEFAULT_MAX_KICKS,
        }
    }

    /// Sets the maximum number of relocations attempted by a single insert.
    pub fn max_kicks(mut self, max_kicks: usize) -> Self {
        self.max_kicks = max_kicks;
        self
    }

    /// Constructs a configuration that spends roughly `total_bits` bits on fingerprints, giving
    /// `total_bits / (bucket_size * fingerprint_bits)` buckets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any parameter is 0 or if `total_bits` is too small for a
    /// single bucket.
    pub fn from_total_bits(
        total_bits: usize,
        bucket_size: usize,
        fingerprint_bits: usize,
    ) -> Result<Self> {
        let bucket_bits = bucket_size
            .checked_mul(fingerprint_bits)
            .filter(|bits| *bits > 0)
            .ok_or_else(|| {
                invalid_configuration(
                    "cuckoo filter bucket_size and fingerprint_bits must be positive",
                )
            })?;
        let config = CuckooConfig::new(total_bits / bucket_bits, bucket_size, fingerprint_bits);
        config.validate()?;
        Ok(config)
    }

    /// Checks that every parameter is positive and that fingerprints fit in 64 bits.
    pub fn validate(&self) -> Result<()> {
        if self.num_buckets == 0 {
            return Err(invalid_configuration("cuckoo filter num_buckets must be positive"));
        }
        if self.bucket_size == 0 {
            return Err(invalid_configuration("cuckoo filter bucket_size must be positive"));
        }
        if self.fingerprint_bits == 0 || self.fingerprint_bits > 64 {
            return Err(invalid_configuration(format!(
                "cuckoo filter fingerprint_bits must be in [1, 64], got {}",
                self.fingerprint_bits,
            )));
        }
        if self.max_kicks == 0 {
            return Err(invalid_configuration("cuckoo filter max_kicks must be positive"));
        }
        Ok(())
    }
}

/// A space-efficient probabilistic data structure to test for membership in a set.
///
/// A cuckoo filter is based on cuckoo hashing and is essentially a cuckoo hash table storing
/// each element's fingerprint. An element's fingerprint lives in one of two candidate buckets:
/// its primary bucket, or the alternate bucket found by XOR-ing the primary index with a hash of
/// the fingerprint. Since the alternate index depends only on the current index and the
/// fingerprint, a stored fingerprint can be moved between its two buckets without knowing the
/// element it came from.
///
/// When both candidate buckets are full, an insert evicts a random fingerprint from one of them
/// and moves it to its alternate bucket, repeating up to `max_kicks` times. If no free slot is
/// found, every relocation is undone and the insert is rejected.
///
/// # Examples
///
/// ```
/// use membership_filters::cuckoo::CuckooFilter;
///
/// let mut filter = CuckooFilter::new(25, 4, 16).unwrap();
///
/// assert!(!filter.contains("foo"));
/// assert!(filter.insert("foo"));
/// assert!(filter.contains("foo"));
///
/// assert_eq!(filter.len(), 1);
/// assert_eq!(filter.capacity(), 128);
/// assert_eq!(filter.bucket_len(), 32);
/// assert_eq!(filter.fingerprint_bit_count(), 16);
/// ```
pub struct CuckooFilter<H = Murmur3Hasher, R = XorShiftRng> {
    max_kicks: usize,
    bucket_size: usize,
    fingerprint_mask: u64,
    fingerprint_vec: BitstringVec,
    bucket_lens: Vec<usize>,
    // slots written by the current kick chain, sized once to `max_kicks`
    kick_path: Vec<usize>,
    hasher: H,
    rng: R,
    inserted_count: usize,
    total_kicks: u64,
}

impl CuckooFilter {
    /// Constructs a new, empty `CuckooFilter` with `num_buckets` buckets of `bucket_size`
    /// fingerprints of `fingerprint_bits` bits each, and a maximum of 500 relocations per insert.
    /// Evictions are seeded from entropy.
    ///
    /// The number of buckets will be rounded up to the next power of two.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if any parameter is 0 or if `fingerprint_bits` is greater
    /// than 32.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::new(1024, 4, 16).unwrap();
    /// assert!(CuckooFilter::new(1024, 4, 0).is_err());
    /// ```
    pub fn new(num_buckets: usize, bucket_size: usize, fingerprint_bits: usize) -> Result<Self> {
        Self::from_config(&CuckooConfig::new(
            num_buckets,
            bucket_size,
            fingerprint_bits,
        ))
    }

    /// Constructs a new, empty `CuckooFilter` from a configuration.
    pub fn from_config(config: &CuckooConfig) -> Result<Self> {
        Self::with_hasher_and_rng(config, Murmur3Hasher, XorShiftRng::from_entropy())
    }
}

impl<H, R> CuckooFilter<H, R>
where
    H: SeededHasher,
    R: Rng,
{
    /// Constructs a new, empty `CuckooFilter` from a configuration, a hasher, and the random
    /// source used to choose eviction victims.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the configuration is invalid or if `fingerprint_bits` is
    /// wider than the hasher's output.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::{CuckooConfig, CuckooFilter};
    /// use membership_filters::hash::Murmur3Hasher;
    /// use rand::SeedableRng;
    /// use rand_xorshift::XorShiftRng;
    ///
    /// let filter = CuckooFilter::with_hasher_and_rng(
    ///     &CuckooConfig::new(1024, 4, 16),
    ///     Murmur3Hasher,
    ///     XorShiftRng::seed_from_u64(0),
    /// )
    /// .unwrap();
    /// ```
    pub fn with_hasher_and_rng(config: &CuckooConfig, hasher: H, rng: R) -> Result<Self> {
        config.validate()?;
        if config.fingerprint_bits > hasher.output_bits() as usize {
            return Err(invalid_configuration(format!(
                "cuckoo filter fingerprint_bits must not exceed the {}-bit hash width, got {}",
                hasher.output_bits(),
                config.fingerprint_bits,
            )));
        }
        let bucket_len = config.num_buckets.checked_next_power_of_two();
        let slot_count = bucket_len.and_then(|len| len.checked_mul(config.bucket_size));
        let (bucket_len, slot_count) = match (bucket_len, slot_count) {
            (Some(bucket_len), Some(slot_count)) => (bucket_len, slot_count),
            _ => {
                return Err(invalid_configuration(format!(
                    "cuckoo filter with {} buckets of {} entries is too large",
                    config.num_buckets, config.bucket_size,
                )))
            }
        };
        debug!(
            "constructing cuckoo filter with {} buckets of {} {}-bit fingerprints",
            bucket_len, config.bucket_size, config.fingerprint_bits
        );

        Ok(CuckooFilter {
            max_kicks: config.max_kicks,
            bucket_size: config.bucket_size,
            fingerprint_mask: get_mask(config.fingerprint_bits),
            fingerprint_vec: BitstringVec::new(config.fingerprint_bits, slot_count),
            bucket_lens: vec![0; bucket_len],
            kick_path: vec![0; config.max_kicks],
            hasher,
            rng,
            inserted_count: 0,
            total_kicks: 0,
        })
    }

    #[inline]
    fn get_vec_index(&self, index: usize, bucket_index: usize) -> usize {
        index * self.bucket_size + bucket_index
    }

    fn get_fingerprint(&self, element: &[u8]) -> u64 {
        let fingerprint = self.hasher.hash(element, FINGERPRINT_SEED) & self.fingerprint_mask;
        // 0 marks an empty slot
        if fingerprint == 0 {
            1
        } else {
            fingerprint
        }
    }

    fn get_primary_index(&self, element: &[u8]) -> usize {
        (self.hasher.hash(element, PRIMARY_INDEX_SEED) % self.bucket_len() as u64) as usize
    }

    fn get_alt_index(&self, index: usize, fingerprint: u64) -> usize {
        let mut buffer = [0u8; 20];
        let digits = decimal_digits(fingerprint, &mut buffer);
        let hash = self.hasher.hash(digits, ALT_INDEX_SEED);
        // `bucket_len` is a power of two, so reducing before the XOR keeps the mapping symmetric
        index ^ (hash % self.bucket_len() as u64) as usize
    }

    fn get_fingerprint_and_indexes(&self, element: &[u8]) -> (u64, usize, usize) {
        let fingerprint = self.get_fingerprint(element);
        let index_1 = self.get_primary_index(element);
        let index_2 = self.get_alt_index(index_1, fingerprint);
        (fingerprint, index_1, index_2)
    }

    fn insert_fingerprint(&mut self, fingerprint: u64, index: usize) -> bool {
        let bucket_len = self.bucket_lens[index];
        if bucket_len == self.bucket_size {
            return false;
        }
        let vec_index = self.get_vec_index(index, bucket_len);
        self.fingerprint_vec.set(vec_index, fingerprint);
        self.bucket_lens[index] += 1;
        true
    }

    fn bucket_contains(&self, fingerprint: u64, index: usize) -> bool {
        (0..self.bucket_lens[index]).any(|bucket_index| {
            self.fingerprint_vec.get(self.get_vec_index(index, bucket_index)) == fingerprint
        })
    }

    /// Inserts an element into the cuckoo filter. Returns `false` if no free slot was found within
    /// `max_kicks` relocations, in which case the filter is left exactly as it was.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::new(100, 4, 16).unwrap();
    /// assert!(filter.insert("foo"));
    /// ```
    pub fn insert<E>(&mut self, element: &E) -> bool
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let (mut fingerprint, index_1, index_2) =
            self.get_fingerprint_and_indexes(element.as_ref());
        if self.insert_fingerprint(fingerprint, index_1)
            || self.insert_fingerprint(fingerprint, index_2)
        {
            self.inserted_count += 1;
            return true;
        }

        // have to kick out an entry
        let mut index = if self.rng.gen::<bool>() {
            index_1
        } else {
            index_2
        };
        for kick in 0..self.max_kicks {
            let bucket_index = self.rng.gen_range(0, self.bucket_size);
            let vec_index = self.get_vec_index(index, bucket_index);
            let victim = self.fingerprint_vec.set(vec_index, fingerprint);
            self.kick_path[kick] = vec_index;
            self.total_kicks += 1;

            fingerprint = victim;
            let next_index = self.get_alt_index(index, fingerprint);
            trace!(
                "relocating fingerprint {:#x} from bucket {} to bucket {}",
                fingerprint,
                index,
                next_index
            );
            index = next_index;
            if self.insert_fingerprint(fingerprint, index) {
                self.inserted_count += 1;
                return true;
            }
        }

        // walk the chain backwards, swapping the homeless fingerprint into each slot it was
        // evicted from, so no previously inserted element is lost
        for kick in (0..self.max_kicks).rev() {
            fingerprint = self.fingerprint_vec.set(self.kick_path[kick], fingerprint);
        }
        debug!(
            "cuckoo filter rejected an insert after {} kicks ({} of {} slots occupied)",
            self.max_kicks,
            self.fingerprint_vec.occupied_len(),
            self.capacity()
        );
        false
    }

    /// Checks if an element is possibly in the cuckoo filter.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::new(100, 4, 16).unwrap();
    ///
    /// assert!(!filter.contains("foo"));
    /// filter.insert("foo");
    /// assert!(filter.contains("foo"));
    /// ```
    pub fn contains<E>(&self, element: &E) -> bool
    where
        E: AsRef<[u8]> + ?Sized,
    {
        let (fingerprint, index_1, index_2) = self.get_fingerprint_and_indexes(element.as_ref());
        self.bucket_contains(fingerprint, index_1) || self.bucket_contains(fingerprint, index_2)
    }

    /// Returns the number of elements successfully inserted into the cuckoo filter.
    pub fn len(&self) -> usize {
        self.inserted_count
    }

    /// Returns `true` if nothing has been inserted into the cuckoo filter.
    pub fn is_empty(&self) -> bool {
        self.inserted_count == 0
    }

    /// Returns the total number of fingerprint slots in the cuckoo filter.
    pub fn capacity(&self) -> usize {
        self.fingerprint_vec.len()
    }

    /// Returns the number of buckets in the cuckoo filter.
    pub fn bucket_len(&self) -> usize {
        self.bucket_lens.len()
    }

    /// Returns the number of fingerprints each bucket holds.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Returns the number of bits in each fingerprint.
    pub fn fingerprint_bit_count(&self) -> usize {
        self.fingerprint_vec.bit_count()
    }

    /// Returns the number of bits allocated to fingerprints.
    pub fn bit_count(&self) -> usize {
        self.capacity() * self.fingerprint_bit_count()
    }

    /// Returns the number of bits allocated per fingerprint slot, which is the fingerprint width.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::CuckooFilter;
    ///
    /// let filter = CuckooFilter::new(1024, 4, 12).unwrap();
    ///
    /// assert_eq!(filter.bit_count(), 1024 * 4 * 12);
    /// assert!((filter.bits_per_item() - 12.0).abs() < std::f64::EPSILON);
    /// ```
    pub fn bits_per_item(&self) -> f64 {
        self.bit_count() as f64 / self.capacity() as f64
    }

    /// Returns the maximum number of relocations attempted by a single insert.
    pub fn max_kicks(&self) -> usize {
        self.max_kicks
    }

    /// Returns the number of relocations performed over the lifetime of the cuckoo filter,
    /// including those that were undone by a rejected insert.
    pub fn total_kicks(&self) -> u64 {
        self.total_kicks
    }

    /// Returns the estimated false positive probability of the cuckoo filter. This value will
    /// increase as more items are added.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::cuckoo::CuckooFilter;
    ///
    /// let mut filter = CuckooFilter::new(32, 4, 11).unwrap();
    /// assert!(filter.estimated_fpp() < std::f64::EPSILON);
    ///
    /// filter.insert("foo");
    /// assert!(filter.estimated_fpp() > std::f64::EPSILON);
    /// assert!(filter.estimated_fpp() < 0.01);
    /// ```
    pub fn estimated_fpp(&self) -> f64 {
        let fingerprints_count = 2.0f64.powi(self.fingerprint_bit_count() as i32);
        let single_fpp = (fingerprints_count - 2.0) / (fingerprints_count - 1.0);
        let occupied_ratio = self.fingerprint_vec.occupied_len() as f64 / self.capacity() as f64;
        1.0 - single_fpp.powf(2.0 * self.bucket_size as f64 * occupied_ratio)
    }

    /// Returns a reference to the cuckoo filter's hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }
}

fn get_mask(bit_count: usize) -> u64 {
    if bit_count == 64 {
        !0
    } else {
        (1u64 << bit_count) - 1
    }
}

fn decimal_digits(mut value: u64, buffer: &mut [u8; 20]) -> &[u8] {
    let mut start = buffer.len();
    loop {
        start -= 1;
        buffer[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buffer[start..]
}

impl<H, R> fmt::Debug for CuckooFilter<H, R>
where
    H: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuckooFilter")
            .field("max_kicks", &self.max_kicks)
            .field("bucket_size", &self.bucket_size)
            .field("bucket_len", &self.bucket_lens.len())
            .field("fingerprint_bit_count", &self.fingerprint_vec.bit_count())
            .field("inserted_count", &self.inserted_count)
            .field("hasher", &self.hasher)
            .finish()
    }
}

impl<H, R> PartialEq for CuckooFilter<H, R>
where
    H: PartialEq,
{
    fn eq(&self, other: &CuckooFilter<H, R>) -> bool {
        self.max_kicks == other.max_kicks
            && self.bucket_size == other.bucket_size
            && self.fingerprint_vec == other.fingerprint_vec
            && self.bucket_lens == other.bucket_lens
            && self.hasher == other.hasher
            && self.inserted_count == other.inserted_count
    }
}
