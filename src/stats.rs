//! Order statistics over batches of run totals: percentiles, histograms and
//! the budget survival curve.
//!
//! The percentile convention is the observed value at index `floor(N * p)`
//! clamped to `N - 1` — no interpolation — so fixtures reproduce exactly
//! across platforms. Degenerate inputs (empty batch, all-equal population)
//! return zeroed or single-bucket results rather than erroring.

use serde::{Deserialize, Serialize};

/// Bucket count used for batch cost histograms.
pub const HISTOGRAM_BUCKETS: usize = 20;

/// Number of budget levels swept for the survival curve.
pub const SURVIVAL_POINTS: usize = 50;

/// Five-number summary of one quantity across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuantitySummary {
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub worst: u64,
}

/// Index of the p-th percentile in a population of `n` sorted values.
pub fn percentile_index(n: usize, p: f64) -> usize {
    ((n as f64 * p).floor() as usize).min(n.saturating_sub(1))
}

/// Summarize one quantity. Sorts the values in place.
pub fn summarize(values: &mut [u64]) -> QuantitySummary {
    if values.is_empty() {
        return QuantitySummary::default();
    }
    values.sort_unstable();
    let n = values.len();
    let sum: u64 = values.iter().sum();
    QuantitySummary {
        mean: sum as f64 / n as f64,
        p50: values[percentile_index(n, 0.50)],
        p90: values[percentile_index(n, 0.90)],
        p99: values[percentile_index(n, 0.99)],
        worst: values[n - 1],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub percent: f64,
    pub cumulative_count: usize,
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub buckets: Vec<HistogramBucket>,
}

/// Equal-width histogram over a sorted population. An all-equal population
/// degenerates to width 1 with everything in the first bucket.
pub fn histogram(sorted: &[u64], bucket_count: usize) -> Histogram {
    if sorted.is_empty() || bucket_count == 0 {
        return Histogram {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            buckets: Vec::new(),
        };
    }
    let min = sorted[0] as f64;
    let max = sorted[sorted.len() - 1] as f64;
    let sum: u64 = sorted.iter().sum();
    let mean = sum as f64 / sorted.len() as f64;

    let span = max - min;
    let width = if span > 0.0 {
        span / bucket_count as f64
    } else {
        1.0
    };

    let mut counts = vec![0usize; bucket_count];
    for value in sorted {
        let offset = (*value as f64 - min) / width;
        // The maximum lands exactly on the upper edge; clamp it inward.
        let index = (offset.floor() as usize).min(bucket_count - 1);
        counts[index] += 1;
    }

    let total = sorted.len();
    let mut cumulative = 0usize;
    let buckets = counts
        .iter()
        .enumerate()
        .map(|(index, count)| {
            cumulative += count;
            HistogramBucket {
                lower: min + index as f64 * width,
                upper: min + (index + 1) as f64 * width,
                count: *count,
                percent: *count as f64 / total as f64 * 100.0,
                cumulative_count: cumulative,
                cumulative_percent: cumulative as f64 / total as f64 * 100.0,
            }
        })
        .collect();

    Histogram {
        min,
        max,
        mean,
        buckets,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurvivalPoint {
    pub budget: f64,
    /// Fraction of all runs that reached the target at a cost within budget.
    pub success_rate: f64,
}

/// Success probability as a function of currency budget, swept over equally
/// spaced levels from the cheapest to the most expensive observed run.
///
/// `runs` must be sorted ascending by cost; each entry is (cost, success).
/// One pointer advances over the population, so the sweep is O(N + P).
pub fn survival_curve(runs: &[(u64, bool)], points: usize) -> Vec<SurvivalPoint> {
    if runs.is_empty() {
        return Vec::new();
    }
    let points = points.max(2);
    let total = runs.len();
    let min = runs[0].0 as f64;
    let max = runs[total - 1].0 as f64;
    let step = (max - min) / (points - 1) as f64;

    let mut curve = Vec::with_capacity(points);
    let mut cursor = 0usize;
    let mut successes = 0usize;
    for level in 0..points {
        let budget = min + level as f64 * step;
        while cursor < total && runs[cursor].0 as f64 <= budget {
            if runs[cursor].1 {
                successes += 1;
            }
            cursor += 1;
        }
        curve.push(SurvivalPoint {
            budget,
            success_rate: successes as f64 / total as f64,
        });
    }
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_index_uses_floor_convention() {
        assert_eq!(percentile_index(10, 0.50), 5);
        assert_eq!(percentile_index(10, 0.90), 9);
        assert_eq!(percentile_index(10, 0.99), 9);
        assert_eq!(percentile_index(100, 0.99), 99);
        assert_eq!(percentile_index(101, 0.99), 99);
        assert_eq!(percentile_index(1, 0.50), 0);
        assert_eq!(percentile_index(0, 0.50), 0);
    }

    #[test]
    fn summarize_pins_exact_values() {
        let mut values = vec![100, 90, 80, 70, 60, 50, 40, 30, 20, 10];
        let summary = summarize(&mut values);
        assert_eq!(summary.p50, 60);
        assert_eq!(summary.p90, 100);
        assert_eq!(summary.p99, 100);
        assert_eq!(summary.worst, 100);
        assert!((summary.mean - 55.0).abs() < 1e-12);
    }

    #[test]
    fn summarize_empty_is_zeroed() {
        assert_eq!(summarize(&mut []), QuantitySummary::default());
    }

    #[test]
    fn histogram_counts_and_cumulative_percentages() {
        let sorted = vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 100];
        let histogram = histogram(&sorted, 10);
        assert_eq!(histogram.min, 0.0);
        assert_eq!(histogram.max, 100.0);
        assert_eq!(histogram.buckets.len(), 10);
        let total: usize = histogram.buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 10);
        // The maximum clamps into the last bucket instead of falling out.
        assert_eq!(histogram.buckets[9].count, 1);
        assert_eq!(histogram.buckets[9].cumulative_count, 10);
        assert!((histogram.buckets[9].cumulative_percent - 100.0).abs() < 1e-12);
    }

    #[test]
    fn histogram_all_equal_uses_unit_width() {
        let sorted = vec![42, 42, 42];
        let histogram = histogram(&sorted, 5);
        assert_eq!(histogram.buckets[0].count, 3);
        assert!((histogram.buckets[0].upper - histogram.buckets[0].lower - 1.0).abs() < 1e-12);
        for bucket in &histogram.buckets[1..] {
            assert_eq!(bucket.count, 0);
        }
    }

    #[test]
    fn histogram_empty_is_degenerate() {
        let histogram = histogram(&[], 10);
        assert!(histogram.buckets.is_empty());
        assert_eq!(histogram.mean, 0.0);
    }

    #[test]
    fn survival_curve_is_monotone_and_ignores_failed_runs() {
        let runs = vec![
            (100, true),
            (200, false),
            (300, true),
            (400, false),
            (500, true),
        ];
        let curve = survival_curve(&runs, 5);
        assert_eq!(curve.len(), 5);
        for pair in curve.windows(2) {
            assert!(pair[1].success_rate >= pair[0].success_rate);
        }
        // All five runs fit the final budget but only three succeeded.
        let last = curve.last().expect("last point");
        assert!((last.success_rate - 0.6).abs() < 1e-12);
    }

    #[test]
    fn survival_curve_empty_population() {
        assert!(survival_curve(&[], 10).is_empty());
    }
}
