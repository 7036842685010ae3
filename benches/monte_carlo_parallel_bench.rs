//! Compare sequential vs parallel Monte Carlo batch times.
//!
//! Run with: `cargo bench --bench monte_carlo_parallel`

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use awaken::monte_carlo::{run_batch, run_batch_parallel};
use awaken::sim::{EnhanceConfig, RateTable, ResourceLimits};

fn bench_monte_carlo_sequential_vs_parallel(c: &mut Criterion) {
    let table = RateTable::default();
    let mut config = EnhanceConfig::for_tiers(0, 8);
    config.blessing_tiers = [3, 5, 0];
    config.ward_tier = 5;
    config.use_path_a = true;
    let limits = ResourceLimits::unlimited();
    let seed = 42u64;
    let runs = 2000;

    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(20);
    group.measurement_time(std::time::Duration::from_secs(10));

    group.bench_function("sequential", |b| {
        b.iter(|| black_box(run_batch(&config, &table, runs, seed, &limits)));
    });

    group.bench_function("parallel", |b| {
        b.iter(|| black_box(run_batch_parallel(&config, &table, runs, seed, &limits)));
    });

    group.finish();
}

criterion_group!(benches, bench_monte_carlo_sequential_vs_parallel);
criterion_main!(benches);
