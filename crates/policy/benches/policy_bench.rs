//! Retention engine benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sk_core::{newest_first, SnapshotIdentity};
use snapkeep_policy::{evaluate, RetentionPolicy};
use std::path::Path;

fn synthetic_inventory(count: usize) -> Vec<SnapshotIdentity> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let records = (0..count)
        .map(|_| {
            let rel = format!(
                "{}/{:02}/{:02}/{:02}{:02}{:02}",
                rng.gen_range(2000..=2030),
                rng.gen_range(1..=12),
                rng.gen_range(1..=28),
                rng.gen_range(0..24),
                rng.gen_range(0..60),
                rng.gen_range(0..60)
            );
            SnapshotIdentity::parse(Path::new(&rel)).expect("synthetic path is well formed")
        })
        .collect();
    newest_first(records)
}

fn bench_evaluate(c: &mut Criterion) {
    let policy = RetentionPolicy::new(24, 7, 4, 12, 5);
    let mut group = c.benchmark_group("evaluate");

    for size in [1_000usize, 10_000, 100_000] {
        let records = synthetic_inventory(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let rotated = evaluate(records.iter().cloned(), &policy, false).count();
                black_box(rotated)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_evaluate);
criterion_main!(benches);
