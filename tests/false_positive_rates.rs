use membership_filters::bloom::BloomFilter;
use membership_filters::cuckoo::{CuckooConfig, CuckooFilter};
use membership_filters::hash::Murmur3Hasher;
use membership_filters::quotient::QuotientFilter;
use membership_filters::report::{false_positive_rate, insert_all, RejectPolicy};
use rand::distributions::Alphanumeric;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use std::collections::HashSet;

fn random_strings(rng: &mut XorShiftRng, count: usize, len: usize) -> Vec<String> {
    let mut strings = HashSet::with_capacity(count);
    while strings.len() < count {
        strings.insert(rng.sample_iter(&Alphanumeric).take(len).collect::<String>());
    }
    strings.into_iter().collect()
}

fn disjoint_strings(rng: &mut XorShiftRng, count: usize, exclude: &[String]) -> Vec<String> {
    let exclude: HashSet<&String> = exclude.iter().collect();
    random_strings(rng, count + exclude.len(), 10)
        .into_iter()
        .filter(|string| !exclude.contains(string))
        .take(count)
        .collect()
}

#[test]
fn bloom_filter_matches_analytic_bound() {
    let mut rng = XorShiftRng::seed_from_u64(0xB10);
    let items = random_strings(&mut rng, 1000, 10);
    let queries = disjoint_strings(&mut rng, 10_000, &items);
    assert_eq!(queries.len(), 10_000);

    let mut filter = BloomFilter::new(8000, 4).unwrap();
    let report = insert_all(&mut filter, &items, RejectPolicy::Continue);
    assert_eq!(report.inserted, 1000);
    assert_eq!(report.rejected, 0);
    assert_eq!(false_positive_rate(&filter, &items), 1.0);

    // (1 - e^(-4 * 1000 / 8000))^4 is about 2.4%
    let analytic = (1.0 - (-0.5f64).exp()).powi(4);
    let observed = false_positive_rate(&filter, &queries);
    assert!(observed < 0.035, "observed {} vs analytic {}", observed, analytic);
    assert!((observed - analytic).abs() < 0.01);
    assert!((filter.estimated_fpp() - analytic).abs() < 0.01);
}

#[test]
fn cuckoo_filter_stays_under_fingerprint_bound() {
    let mut rng = XorShiftRng::seed_from_u64(0xC0C);
    let items = random_strings(&mut rng, 3500, 10);
    let queries = disjoint_strings(&mut rng, 10_000, &items);

    let config = CuckooConfig::new(1024, 4, 12);
    let mut filter =
        CuckooFilter::with_hasher_and_rng(&config, Murmur3Hasher, XorShiftRng::seed_from_u64(3))
            .unwrap();
    let report = insert_all(&mut filter, &items, RejectPolicy::Continue);
    assert!(report.inserted > 3400);

    let inserted: Vec<&String> = items.iter().filter(|item| filter.contains(*item)).collect();
    assert!(inserted.len() >= report.inserted);

    // 2 * bucket_size / 2^fingerprint_bits is about 0.2%
    let observed = false_positive_rate(&filter, &queries);
    assert!(observed < 2.0 * 4.0 / 4096.0 * 1.5, "observed {}", observed);
}

#[test]
fn quotient_filter_rarely_reports_absent_elements() {
    let mut rng = XorShiftRng::seed_from_u64(0x0F);
    let items = random_strings(&mut rng, 500, 10);
    let queries = disjoint_strings(&mut rng, 10_000, &items);

    let mut filter = QuotientFilter::new(1024).unwrap();
    let report = insert_all(&mut filter, &items, RejectPolicy::Continue);
    assert_eq!(report.inserted, 500);

    assert!(false_positive_rate(&filter, &queries) < 0.001);
}

#[test]
fn identical_filters_answer_identically() {
    let mut rng = XorShiftRng::seed_from_u64(7);
    let items = random_strings(&mut rng, 2000, 8);
    let queries = random_strings(&mut rng, 2000, 8);

    let mut bloom_1 = BloomFilter::new(4096, 3).unwrap();
    let mut bloom_2 = BloomFilter::new(4096, 3).unwrap();
    let mut quotient_1 = QuotientFilter::new(4096).unwrap();
    let mut quotient_2 = QuotientFilter::new(4096).unwrap();
    let config = CuckooConfig::new(256, 4, 8);
    let mut cuckoo_1 =
        CuckooFilter::with_hasher_and_rng(&config, Murmur3Hasher, XorShiftRng::seed_from_u64(9))
            .unwrap();
    let mut cuckoo_2 =
        CuckooFilter::with_hasher_and_rng(&config, Murmur3Hasher, XorShiftRng::seed_from_u64(9))
            .unwrap();

    for item in &items {
        bloom_1.insert(item);
        bloom_2.insert(item);
        assert_eq!(quotient_1.insert(item), quotient_2.insert(item));
        assert_eq!(cuckoo_1.insert(item), cuckoo_2.insert(item));
    }

    for query in &queries {
        assert_eq!(bloom_1.contains(query), bloom_2.contains(query));
        assert_eq!(quotient_1.contains(query), quotient_2.contains(query));
        assert_eq!(cuckoo_1.contains(query), cuckoo_2.contains(query));
    }
}
