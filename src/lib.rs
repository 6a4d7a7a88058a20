//! # membership-filters
//!
//! `membership-filters` contains approximate set-membership filters over opaque byte-string
//! elements: a [`BloomFilter`](bloom::BloomFilter), a [`CuckooFilter`](cuckoo::CuckooFilter), and
//! a [`QuotientFilter`](quotient::QuotientFilter). Each answers "is this element possibly in the
//! set?" using far less memory than an exact set, at the cost of a bounded false positive rate.
//! Bloom and cuckoo filters never report false negatives.
//!
//! All three filters are sized once at construction and never grow. They are meant for
//! single-threaded use: mutation goes through `&mut self`, so concurrent callers must serialize
//! writers themselves.
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! membership-filters = "*"
//! ```
//!
//! ```rust
//! use membership_filters::bloom::BloomFilter;
//! use membership_filters::cuckoo::CuckooFilter;
//! use membership_filters::quotient::QuotientFilter;
//!
//! let mut bloom = BloomFilter::new(1000, 3)?;
//! bloom.insert("apple");
//! assert!(bloom.contains("apple"));
//!
//! let mut cuckoo = CuckooFilter::new(256, 4, 16)?;
//! assert!(cuckoo.insert("apple"));
//! assert!(cuckoo.contains("apple"));
//!
//! let mut quotient = QuotientFilter::new(256)?;
//! quotient.insert("apple")?;
//! assert!(quotient.contains("apple"));
//! # Ok::<(), membership_filters::FilterError>(())
//! ```
//!
//! ## References
//!
//!  - [Cuckoo Filter: Practically Better Than Bloom](https://dl.acm.org/citation.cfm?id=2674994)
//!  > Fan, Bin, Dave G. Andersen, Michael Kaminsky, and Michael D. Mitzenmacher. 2014. “Cuckoo Filter: Practically Better Than Bloom.” In *Proceedings of the 10th Acm International on Conference on Emerging Networking Experiments and Technologies*, 75–88. CoNEXT ’14. New York, NY, USA: ACM. doi:[10.1145/2674005.2674994](https://doi.org/10.1145/2674005.2674994).
//!  - [Don't Thrash: How to Cache Your Hash on Flash](https://dl.acm.org/citation.cfm?id=2350275)
//!  > Bender, Michael A., Martin Farach-Colton, Rob Johnson, Russell Kraner, Bradley C. Kuszmaul, Dzejla Medjedovic, Pablo Montes, Pradeep Shetty, Richard P. Spillane, and Erez Zadok. 2012. “Don’t Thrash: How to Cache Your Hash on Flash.” *Proc. VLDB Endow.* 5 (11): 1627–37. doi:[10.14778/2350229.2350275](https://doi.org/10.14778/2350229.2350275).

#![warn(missing_docs)]

mod bit_vec;
mod bitstring_vec;
pub mod bloom;
pub mod cuckoo;
mod error;
pub mod hash;
pub mod quotient;
pub mod report;
pub mod traits;

pub use crate::error::{FilterError, Result};
pub use crate::traits::MembershipFilter;
