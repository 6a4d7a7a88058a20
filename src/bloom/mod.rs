//! Space-efficient probabilistic data structure for approximate membership queries in a set.

mod bloom_filter;

pub use self::bloom_filter::{BloomConfig, BloomFilter};
