//! Comparison engine benchmarks
//!
//! Benchmarks for strategy dispatch with and without the result cache, and
//! for memoized differences.
//!
//! Run with: `cargo bench --bench comparison_bench -p atemporal-core`

use atemporal_core::{CacheRegistry, ComparisonContext, ComparisonOptions, ComparisonType};
use atemporal_domain::{RoundingMode, TimeUnit, ZonedInstant};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SEED: i128 = 1_700_000_000_000_000_000;

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let registry = CacheRegistry::default();
    let engine = registry.comparison_engine().unwrap();
    let a = ZonedInstant::utc(SEED);
    let b = a.add(90, TimeUnit::Minute).unwrap();

    let mut group = c.benchmark_group("comparison_dispatch");
    let cases = [
        ("fast_path", ComparisonType::IsBefore, None),
        ("unit_day", ComparisonType::IsSame, Some(TimeUnit::Day)),
        ("unit_month", ComparisonType::IsSame, Some(TimeUnit::Month)),
        ("diff_hour", ComparisonType::Diff, Some(TimeUnit::Hour)),
    ];
    for (name, comparison, unit) in cases {
        let uncached = ComparisonContext::new(a, b, comparison)
            .with_options(ComparisonOptions::with_unit(unit).without_cache());
        group.bench_with_input(BenchmarkId::new("uncached", name), &uncached, |bench, ctx| {
            bench.iter(|| black_box(engine.compare(black_box(ctx)).unwrap()));
        });

        let cached = ComparisonContext::new(a, b, comparison)
            .with_options(ComparisonOptions::with_unit(unit));
        group.bench_with_input(BenchmarkId::new("cached", name), &cached, |bench, ctx| {
            bench.iter(|| black_box(engine.compare(black_box(ctx)).unwrap()));
        });
    }
    group.finish();
}

// ============================================================================
// Diff Cache Benchmarks
// ============================================================================

fn bench_diff_cache(c: &mut Criterion) {
    let registry = CacheRegistry::default();
    let diff = registry.diff_cache().unwrap();
    let seed = ZonedInstant::utc(SEED);
    diff.pre_warm(&seed);
    let other = seed.add(1, TimeUnit::Month).unwrap();

    c.bench_function("diff_cache_hit", |bench| {
        bench.iter(|| {
            black_box(diff.diff(black_box(&other), &seed, TimeUnit::Day, None).unwrap())
        });
    });

    let mut offset = 0i128;
    c.bench_function("diff_cache_miss", |bench| {
        bench.iter(|| {
            offset += 1;
            let a = ZonedInstant::utc(SEED + offset);
            black_box(diff.diff(&a, &seed, TimeUnit::Week, Some(RoundingMode::Round)).unwrap())
        });
    });
}

criterion_group!(benches, bench_dispatch, bench_diff_cache);
criterion_main!(benches);
