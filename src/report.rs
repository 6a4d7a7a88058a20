//! Measurements over a stream of elements.
//!
//! These helpers return plain values; formatting them is left to the caller.

use crate::traits::MembershipFilter;
use log::debug;
use std::time::{Duration, Instant};

/// What [`insert_all`] does when a filter rejects an element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RejectPolicy {
    /// Count the rejection and keep inserting.
    Continue,
    /// Stop at the first rejection.
    Stop,
}

/// Outcome of inserting a stream of elements into a filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InsertReport {
    /// Number of elements the filter accepted.
    pub inserted: usize,
    /// Number of elements the filter rejected.
    pub rejected: usize,
    /// Wall-clock time spent inserting.
    pub elapsed: Duration,
    /// Bits the filter allocates per element it is sized to hold.
    pub bits_per_item: f64,
}

/// Inserts every element of `elements` into `filter`.
///
/// # Examples
///
/// ```
/// use membership_filters::cuckoo::CuckooFilter;
/// use membership_filters::report::{insert_all, RejectPolicy};
///
/// let mut filter = CuckooFilter::new(1, 2, 8).unwrap();
/// let report = insert_all(&mut filter, &["a", "b", "c", "d"], RejectPolicy::Stop);
///
/// assert_eq!(report.inserted, 2);
/// assert_eq!(report.rejected, 1);
/// ```
pub fn insert_all<F, I>(filter: &mut F, elements: I, policy: RejectPolicy) -> InsertReport
where
    F: MembershipFilter + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let start = Instant::now();
    let mut inserted = 0;
    let mut rejected = 0;
    for element in elements {
        if filter.try_insert(element.as_ref()) {
            inserted += 1;
        } else {
            rejected += 1;
            if policy == RejectPolicy::Stop {
                break;
            }
        }
    }
    let elapsed = start.elapsed();
    let bits_per_item = filter.bits_per_item();
    debug!(
        "inserted {} elements ({} rejected) in {:?} at {:.2} bits per item",
        inserted, rejected, elapsed, bits_per_item
    );

    InsertReport {
        inserted,
        rejected,
        elapsed,
        bits_per_item,
    }
}

/// Returns the fraction of `queries` that `filter` reports as present. When none of the queries
/// were inserted, this is the observed false positive rate. Returns 0 for an empty query set.
///
/// # Examples
///
/// ```
/// use membership_filters::bloom::BloomFilter;
/// use membership_filters::report::false_positive_rate;
///
/// let mut filter = BloomFilter::new(1000, 3).unwrap();
/// filter.insert("apple");
///
/// assert_eq!(false_positive_rate(&filter, &["apple"]), 1.0);
/// assert_eq!(false_positive_rate(&filter, Vec::<&str>::new()), 0.0);
/// ```
pub fn false_positive_rate<F, I>(filter: &F, queries: I) -> f64
where
    F: MembershipFilter + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let mut total = 0usize;
    let mut positives = 0usize;
    for query in queries {
        total += 1;
        if filter.contains(query.as_ref()) {
            positives += 1;
        }
    }

    if total == 0 {
        0.0
    } else {
        positives as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::{false_positive_rate, insert_all, RejectPolicy};
    use crate::bloom::BloomFilter;
    use crate::cuckoo::CuckooFilter;
    use crate::quotient::QuotientFilter;

    #[test]
    fn test_insert_all_continue() {
        let mut filter = QuotientFilter::new(4).unwrap();
        let elements: Vec<String> = (0..10).map(|index| format!("item{}", index)).collect();
        let report = insert_all(&mut filter, &elements, RejectPolicy::Continue);

        assert_eq!(report.inserted, 4);
        assert_eq!(report.rejected, 6);
        assert_eq!(filter.len(), 4);
    }

    #[test]
    fn test_insert_all_stop() {
        let mut filter = QuotientFilter::new(4).unwrap();
        let elements: Vec<String> = (0..10).map(|index| format!("item{}", index)).collect();
        let report = insert_all(&mut filter, &elements, RejectPolicy::Stop);

        assert_eq!(report.inserted, 4);
        assert_eq!(report.rejected, 1);
        assert!((report.bits_per_item - 32.0).abs() < std::f64::EPSILON);
    }

    #[test]
    fn test_insert_all_reports_bits_per_item() {
        let mut filter = CuckooFilter::new(64, 4, 12).unwrap();
        let report = insert_all(&mut filter, &["apple", "banana"], RejectPolicy::Continue);

        assert_eq!(report.inserted, 2);
        assert!((report.bits_per_item - 12.0).abs() < std::f64::EPSILON);
    }

    #[test]
    fn test_false_positive_rate() {
        let mut filter = BloomFilter::new(1000, 3).unwrap();
        let report = insert_all(&mut filter, &["apple", "banana"], RejectPolicy::Stop);
        assert_eq!(report.inserted, 2);

        assert_eq!(false_positive_rate(&filter, &["apple", "banana"]), 1.0);
        assert!(false_positive_rate(&filter, &["cherry", "durian"]) < 1.0);
    }
}
