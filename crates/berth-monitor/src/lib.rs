//! # berth-monitor
//!
//! The resource sampler: runs one (engine, test type) experiment end to
//! end and produces a sample series plus its run summary.
//!
//! A run tears down any stale workload, starts the requested one (idle
//! compose stack or bounded stress container), waits out the warm-up,
//! then polls process metrics and a power estimate at a fixed interval
//! for the configured duration. The workload is torn down on every exit
//! path before the result propagates. The series is persisted as CSV and
//! the summary as JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use berth_core::{Engine, MonitorConfig, TestType};
//! use berth_monitor::ResourceMonitor;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MonitorConfig::new(Engine::DockerDesktop, TestType::Idle);
//!     let mut monitor = ResourceMonitor::new(config)?;
//!     let summary = monitor.run().await?;
//!     println!("collected {:?}", summary.map(|s| s.samples));
//!     Ok(())
//! }
//! ```

use berth_core::{Engine, TestType};
use berth_engine::EngineError;
use berth_metrics::MetricsError;
use thiserror::Error;

pub mod monitor;
pub mod report;

// Re-export main types
pub use monitor::ResourceMonitor;

/// Result type for monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur during a monitoring run
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] berth_core::Error),

    /// Fatal for the run: the workload never came up
    #[error("Failed to start {test_type} workload for {engine}: {source}")]
    WorkloadStart {
        engine: Engine,
        test_type: TestType,
        #[source]
        source: EngineError,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("Failed to write sample series: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
