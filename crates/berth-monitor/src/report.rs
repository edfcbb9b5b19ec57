//! Persistence of sample series and run summaries

use crate::Result;
use berth_core::{MonitorConfig, RunSummary, Sample};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// One CSV row; field order defines the column order
#[derive(Debug, Serialize)]
struct CsvRow {
    timestamp: String,
    cpu: f64,
    memory_mb: f64,
    power_mw: f64,
}

/// Path of the CSV series for this run
pub fn series_path(config: &MonitorConfig) -> PathBuf {
    config
        .output_dir
        .join(format!("{}_{}_resources.csv", config.engine, config.test_type))
}

/// Path of the JSON summary for this run
pub fn summary_path(config: &MonitorConfig) -> PathBuf {
    config
        .output_dir
        .join(format!("{}_{}_resources.json", config.engine, config.test_type))
}

/// Write the sample series as CSV rows under a header
pub fn write_series(config: &MonitorConfig, series: &[Sample]) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.output_dir)?;

    let path = series_path(config);
    let mut writer = csv::Writer::from_path(&path)?;
    for sample in series {
        writer.serialize(CsvRow {
            timestamp: sample.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            cpu: sample.cpu_percent,
            memory_mb: sample.memory_mb,
            power_mw: sample.power_mw,
        })?;
    }
    writer.flush()?;

    info!("Wrote {} samples to {}", series.len(), path.display());
    Ok(path)
}

/// Write the run summary as pretty-printed JSON
pub fn write_summary(config: &MonitorConfig, summary: &RunSummary) -> Result<PathBuf> {
    std::fs::create_dir_all(&config.output_dir)?;

    let path = summary_path(config);
    std::fs::write(&path, serde_json::to_string_pretty(summary)?)?;

    info!("Wrote summary to {}", path.display());
    Ok(path)
}
