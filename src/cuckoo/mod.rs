//! Space-efficient probabilistic data structure to test for membership in a set using cuckoo
//! hashing over element fingerprints.

mod cuckoo_filter;

const DEFAULT_MAX_KICKS: usize = 500;

pub use self::cuckoo_filter::{CuckooConfig, CuckooFilter};
