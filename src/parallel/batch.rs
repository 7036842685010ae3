//! Batch distribution for parallel simulation.
//!
//! Splits a Monte Carlo batch into chunks for parallel execution and
//! progress reporting; one enhancement run per parallel task.

use crate::monte_carlo::run_batch_chunked;
use crate::parallel::pool::WorkerPool;
use crate::parallel::progress::Progress;
use crate::sim::{EngineError, EnhanceConfig, RateTable, ResourceLimits, RunTotals};

/// Split `total` items into up to `num_batches` ranges `[start, end)`.
/// Batches are as equal in size as possible; later batches may be smaller.
///
/// # Example
/// ```
/// # use awaken::parallel::batch_ranges;
/// let ranges = batch_ranges(100, 4);
/// assert_eq!(ranges, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
/// ```
pub fn batch_ranges(total: usize, num_batches: usize) -> Vec<(usize, usize)> {
    if total == 0 || num_batches == 0 {
        return Vec::new();
    }
    let num_batches = num_batches.min(total);
    let base = total / num_batches;
    let remainder = total % num_batches;
    let mut ranges = Vec::with_capacity(num_batches);
    let mut start = 0;
    for i in 0..num_batches {
        let size = base + if i < remainder { 1 } else { 0 };
        let end = start + size;
        ranges.push((start, end));
        start = end;
    }
    ranges
}

/// Run a Monte Carlo enhancement batch on the given worker pool, reporting
/// through `progress`. This is a convenience that calls
/// [crate::monte_carlo::run_batch_chunked] inside [WorkerPool::install] when
/// a custom worker count is set.
pub fn run_enhancement_batches(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
    pool: &WorkerPool,
    progress: &Progress,
) -> Result<Vec<RunTotals>, EngineError> {
    pool.install(|| run_batch_chunked(config, table, runs, seed, limits, progress))
}
