//! Seeded hash functions shared by all filters.
//!
//! Every filter derives its probe positions, fingerprints, and quotients from a
//! [`SeededHasher`]. Distinct seeds act as independent hash functions, which is all the
//! false-positive analysis of the filters requires.

use rand::Rng;
use siphasher::sip::SipHasher;
use std::cmp;
use std::fmt;
use std::hash::Hasher;
use std::io::Cursor;

/// A hash function family indexed by an integer seed.
///
/// Implementations must be deterministic for identical `(bytes, seed)` pairs for the lifetime of
/// the process.
pub trait SeededHasher {
    /// Hashes `bytes` with the hash function selected by `seed`.
    fn hash(&self, bytes: &[u8], seed: u32) -> u64;

    /// Returns the number of significant bits in the values returned by `hash`.
    fn output_bits(&self) -> u32;
}

/// The unsigned 32-bit x86 variant of MurmurHash3. This is the default hasher for all filters.
///
/// # Examples
///
/// ```
/// use membership_filters::hash::{Murmur3Hasher, SeededHasher};
///
/// let hasher = Murmur3Hasher;
/// assert_eq!(hasher.hash(b"", 0), 0);
/// assert_ne!(hasher.hash(b"foo", 0), hasher.hash(b"foo", 1));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Murmur3Hasher;

/// Computes MurmurHash3 (x86, 32-bit) of `bytes` with `seed`.
pub fn murmur3_32(bytes: &[u8], seed: u32) -> u32 {
    // reading from an in-memory cursor cannot fail
    murmur3::murmur3_32(&mut Cursor::new(bytes), seed).unwrap_or_default()
}

impl SeededHasher for Murmur3Hasher {
    #[inline]
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        u64::from(murmur3_32(bytes, seed))
    }

    fn output_bits(&self) -> u32 {
        32
    }
}

/// A keyed SipHash-2-4 hasher with 64-bit output.
///
/// The seed is written into the hasher state ahead of the element, so each seed selects a
/// different function under the same pair of keys.
#[derive(Clone, Copy)]
pub struct SipHasherBuilder {
    k0: u64,
    k1: u64,
    hasher: SipHasher,
}

impl SipHasherBuilder {
    /// Constructs a new `SipHasherBuilder` that uses the thread-local RNG to seed itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::hash::SipHasherBuilder;
    ///
    /// let hash_builder = SipHasherBuilder::from_entropy();
    /// ```
    pub fn from_entropy() -> Self {
        let mut rng = rand::thread_rng();
        Self::from_seed(rng.gen(), rng.gen())
    }

    /// Constructs a new `SipHasherBuilder` that is seeded with the given keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use membership_filters::hash::{SeededHasher, SipHasherBuilder};
    ///
    /// let hash_builder = SipHasherBuilder::from_seed(0, 0);
    /// assert_eq!(hash_builder.hash(b"foo", 3), SipHasherBuilder::from_seed(0, 0).hash(b"foo", 3));
    /// ```
    pub fn from_seed(k0: u64, k1: u64) -> Self {
        SipHasherBuilder {
            k0,
            k1,
            hasher: SipHasher::new_with_keys(k0, k1),
        }
    }
}

impl SeededHasher for SipHasherBuilder {
    #[inline]
    fn hash(&self, bytes: &[u8], seed: u32) -> u64 {
        let mut hasher = self.hasher;
        hasher.write_u32(seed);
        hasher.write(bytes);
        hasher.finish()
    }

    fn output_bits(&self) -> u32 {
        64
    }
}

impl fmt::Debug for SipHasherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SipHasherBuilder")
            .field("k0", &self.k0)
            .field("k1", &self.k1)
            .finish()
    }
}

impl cmp::PartialEq for SipHasherBuilder {
    fn eq(&self, other: &SipHasherBuilder) -> bool {
        self.k0 == other.k0 && self.k1 == other.k1
    }
}
