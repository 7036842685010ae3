//! Runner throughput benchmarks: enhancement runs per second at several
//! ladder depths.
//!
//! Run with: `cargo bench --bench engine`
//! Results show mean time per run for short, mid and full ladders.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use awaken::sim::{run_capped, run_recorded, EnhanceConfig, RateTable, ResourceLimits};

fn bench_runner(c: &mut Criterion) {
    let table = RateTable::default();
    let limits = ResourceLimits::unlimited();

    let mut group = c.benchmark_group("runner");
    group.sample_size(100);
    group.throughput(Throughput::Elements(1));

    // Short ladder (0 -> 3) - the common quick-estimate case
    let short = EnhanceConfig::for_tiers(0, 3);
    group.bench_function("capped_0_to_3", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_capped(&short, &table, Some(seed), &limits))
        });
    });

    // Mid ladder with wards and blessings in play
    let mut mid = EnhanceConfig::for_tiers(0, 7);
    mid.blessing_tiers = [3, 5, 0];
    mid.ward_tier = 5;
    group.bench_function("capped_0_to_7", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_capped(&mid, &table, Some(seed), &limits))
        });
    });

    // Full ladder through both forge paths
    let mut full = EnhanceConfig::for_tiers(0, 10);
    full.blessing_tiers = [3, 5, 8];
    full.ward_tier = 5;
    full.use_path_a = true;
    full.use_path_b = true;
    group.bench_function("capped_0_to_10", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_capped(&full, &table, Some(seed), &limits))
        });
    });

    // Recording variant for comparison: same rules, full attempt log kept
    group.bench_function("recorded_0_to_7", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(run_recorded(&mid, &table, Some(seed)))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_runner);
criterion_main!(benches);
