//! Monte Carlo batches over the capped runner: N independent runs with
//! fanned-out seeds, reduced to percentile summaries, a cost histogram and
//! the budget survival curve.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::parallel::{batch_ranges, Progress};
use crate::sim::{
    run_capped, EngineError, EnhanceConfig, RateTable, ResourceLimits, RunTotals,
};
use crate::stats::{
    histogram, summarize, survival_curve, Histogram, QuantitySummary, SurvivalPoint,
    HISTOGRAM_BUCKETS, SURVIVAL_POINTS,
};

/// Number of progress-reporting chunks for long batches.
const PROGRESS_CHUNK_COUNT: usize = 40;

/// Aggregate statistics over one batch. An empty batch yields the zeroed
/// default; a nonzero batch with no successful run reports infinite risk
/// metrics rather than erroring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchAggregate {
    pub runs: usize,
    /// Fraction of runs that reached the target tier.
    pub completion_rate: f64,
    pub cost: QuantitySummary,
    pub attempts: QuantitySummary,
    pub stones: QuantitySummary,
    /// Blessing items summed across the three slots.
    pub blessings: QuantitySummary,
    pub wards: QuantitySummary,
    pub cores: QuantitySummary,
    /// Mean cost over all runs divided by the completion rate.
    pub expected_cost_per_success: f64,
    /// Expected number of whole runs until one succeeds.
    pub expected_runs_to_succeed: f64,
    pub histogram: Option<Histogram>,
    /// Present only when some runs failed under a resource cap.
    pub survival: Option<Vec<SurvivalPoint>>,
}

/// Run `runs` independent capped simulations sequentially. Run `i` is seeded
/// with `seed.wrapping_add(i)`, so the result set depends only on the seed,
/// never on scheduling.
pub fn run_batch(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
) -> Result<Vec<RunTotals>, EngineError> {
    run_batch_with_parallelism(config, table, runs, seed, limits, false)
}

/// Like [run_batch] but distributes runs across all CPU cores via Rayon.
/// Produces the same result set as the sequential variant.
pub fn run_batch_parallel(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
) -> Result<Vec<RunTotals>, EngineError> {
    run_batch_with_parallelism(config, table, runs, seed, limits, true)
}

fn run_batch_with_parallelism(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
    parallel: bool,
) -> Result<Vec<RunTotals>, EngineError> {
    let run_one =
        |index: usize| run_capped(config, table, Some(seed.wrapping_add(index as u64)), limits);

    if parallel {
        (0..runs).into_par_iter().map(run_one).collect()
    } else {
        (0..runs).map(run_one).collect()
    }
}

/// Parallel batch in progress-reporting chunks. Checks for cancellation
/// between chunks and returns the runs finished so far; a run is never cut
/// short mid-attempt.
pub fn run_batch_chunked(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
    progress: &Progress,
) -> Result<Vec<RunTotals>, EngineError> {
    let mut all = Vec::with_capacity(runs);
    for (start, end) in batch_ranges(runs, PROGRESS_CHUNK_COUNT) {
        if progress.is_cancelled() {
            debug!("batch cancelled after {} of {} runs", all.len(), runs);
            break;
        }
        let chunk: Vec<RunTotals> = (start..end)
            .into_par_iter()
            .map(|index| run_capped(config, table, Some(seed.wrapping_add(index as u64)), limits))
            .collect::<Result<_, _>>()?;
        all.extend(chunk);
        progress.advance(end - start);
        debug!("batch progress {:.0}%", progress.percent());
    }
    Ok(all)
}

/// Reduce a batch to its aggregate statistics. Sorts by value internally, so
/// the input order (and therefore parallel completion order) is irrelevant.
pub fn aggregate(runs: &[RunTotals]) -> BatchAggregate {
    if runs.is_empty() {
        return BatchAggregate::default();
    }
    let n = runs.len();

    let mut costs: Vec<u64> = runs.iter().map(|r| r.cost).collect();
    let mut attempts: Vec<u64> = runs.iter().map(|r| r.attempts).collect();
    let mut stones: Vec<u64> = runs.iter().map(|r| r.consumed.stones).collect();
    let mut blessings: Vec<u64> = runs
        .iter()
        .map(|r| r.consumed.blessings.iter().sum())
        .collect();
    let mut wards: Vec<u64> = runs.iter().map(|r| r.consumed.wards).collect();
    let mut cores: Vec<u64> = runs.iter().map(|r| r.consumed.cores).collect();

    let cost = summarize(&mut costs);
    let successes = runs.iter().filter(|r| r.reached_target).count();
    let completion_rate = successes as f64 / n as f64;

    let (expected_cost_per_success, expected_runs_to_succeed) = if successes > 0 {
        (cost.mean / completion_rate, 1.0 / completion_rate)
    } else {
        (f64::INFINITY, f64::INFINITY)
    };

    // Failed runs stay in the population: their cost at cap exhaustion is
    // real spend, not an outlier to discard.
    let survival = if successes < n {
        let mut by_cost: Vec<(u64, bool)> =
            runs.iter().map(|r| (r.cost, r.reached_target)).collect();
        by_cost.sort_unstable_by_key(|(cost, _)| *cost);
        Some(survival_curve(&by_cost, SURVIVAL_POINTS))
    } else {
        None
    };

    BatchAggregate {
        runs: n,
        completion_rate,
        cost,
        attempts: summarize(&mut attempts),
        stones: summarize(&mut stones),
        blessings: summarize(&mut blessings),
        wards: summarize(&mut wards),
        cores: summarize(&mut cores),
        expected_cost_per_success,
        expected_runs_to_succeed,
        histogram: Some(histogram(&costs, HISTOGRAM_BUCKETS)),
        survival,
    }
}

/// Run a batch sequentially and aggregate it in one call.
pub fn analyze(
    config: &EnhanceConfig,
    table: &RateTable,
    runs: usize,
    seed: u64,
    limits: &ResourceLimits,
) -> Result<BatchAggregate, EngineError> {
    let totals = run_batch(config, table, runs, seed, limits)?;
    Ok(aggregate(&totals))
}
