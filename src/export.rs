//! CSV export of batch aggregates for spreadsheet handoff.

use std::path::{Path, PathBuf};

use csv::Writer;
use thiserror::Error;

use crate::monte_carlo::BatchAggregate;
use crate::stats::{Histogram, QuantitySummary, SurvivalPoint};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

fn summary_row(
    writer: &mut Writer<std::fs::File>,
    name: &str,
    summary: &QuantitySummary,
) -> Result<(), ExportError> {
    writer.write_record([
        name.to_string(),
        format!("{:.2}", summary.mean),
        summary.p50.to_string(),
        summary.p90.to_string(),
        summary.p99.to_string(),
        summary.worst.to_string(),
    ])?;
    Ok(())
}

pub fn write_summary_csv(path: &Path, aggregate: &BatchAggregate) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["quantity", "mean", "p50", "p90", "p99", "worst"])?;
    summary_row(&mut writer, "cost", &aggregate.cost)?;
    summary_row(&mut writer, "attempts", &aggregate.attempts)?;
    summary_row(&mut writer, "stones", &aggregate.stones)?;
    summary_row(&mut writer, "blessings", &aggregate.blessings)?;
    summary_row(&mut writer, "wards", &aggregate.wards)?;
    summary_row(&mut writer, "cores", &aggregate.cores)?;
    writer.flush()?;
    Ok(())
}

pub fn write_histogram_csv(path: &Path, histogram: &Histogram) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "lower",
        "upper",
        "count",
        "percent",
        "cumulative_count",
        "cumulative_percent",
    ])?;
    for bucket in &histogram.buckets {
        writer.write_record([
            format!("{:.2}", bucket.lower),
            format!("{:.2}", bucket.upper),
            bucket.count.to_string(),
            format!("{:.2}", bucket.percent),
            bucket.cumulative_count.to_string(),
            format!("{:.2}", bucket.cumulative_percent),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_survival_csv(path: &Path, curve: &[SurvivalPoint]) -> Result<(), ExportError> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(["budget", "success_rate"])?;
    for point in curve {
        writer.write_record([
            format!("{:.2}", point.budget),
            format!("{:.6}", point.success_rate),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every section of an aggregate into `dir` and return the paths
/// written. Histogram and survival files appear only when present.
pub fn export_aggregate(dir: &Path, aggregate: &BatchAggregate) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let summary_path = dir.join("summary.csv");
    write_summary_csv(&summary_path, aggregate)?;
    written.push(summary_path);

    if let Some(histogram) = &aggregate.histogram {
        let path = dir.join("histogram.csv");
        write_histogram_csv(&path, histogram)?;
        written.push(path);
    }
    if let Some(curve) = &aggregate.survival {
        let path = dir.join("survival.csv");
        write_survival_csv(&path, curve)?;
        written.push(path);
    }
    Ok(written)
}
