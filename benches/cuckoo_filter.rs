use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use membership_filters::cuckoo::{CuckooConfig, CuckooFilter};
use membership_filters::hash::Murmur3Hasher;
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

fn filled_filter(item_count: u32) -> CuckooFilter {
    let config = CuckooConfig::new(256, 4, 16);
    let rng = XorShiftRng::seed_from_u64(0);
    let mut filter = CuckooFilter::with_hasher_and_rng(&config, Murmur3Hasher, rng).unwrap();
    for i in 0..item_count {
        filter.insert(&i.to_le_bytes());
    }
    filter
}

fn bench_insert(c: &mut Criterion) {
    let mut initial_items = 0;
    while initial_items < 1024 - 32 {
        c.bench_function(&format!("cuckoo insert {}", initial_items), |b| {
            b.iter_batched_ref(
                || filled_filter(initial_items),
                |filter| filter.insert(&0xDEAD_BEEFu32.to_le_bytes()),
                BatchSize::PerIteration,
            )
        });
        initial_items += 128;
    }
}

fn bench_contains(c: &mut Criterion) {
    let filter = filled_filter(900);
    c.bench_function("cuckoo contains present", |b| {
        b.iter(|| filter.contains(&450u32.to_le_bytes()))
    });
    c.bench_function("cuckoo contains absent", |b| {
        b.iter(|| filter.contains(&0xDEAD_BEEFu32.to_le_bytes()))
    });
}

criterion_group!(benches, bench_insert, bench_contains);
criterion_main!(benches);
