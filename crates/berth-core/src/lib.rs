//! # berth-core
//!
//! Core types, configuration, and summary math shared by the berth
//! benchmark suite.
//!
//! This crate provides:
//! - The fixed set of container engines under test and their lookup tables
//! - Benchmark configuration for the resource monitor and startup prober
//! - Sample and summary data structures persisted by benchmark runs
//! - Error handling types shared across the workspace

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{MonitorConfig, PowerStrategy, StartupConfig};
pub use error::{Error, Result};
pub use types::{
    Engine, RunMetrics, RunSummary, Sample, StartupAttempt, StartupResults, StartupSummary,
    TestType,
};
