//! # berth-metrics
//!
//! Metric-source adapters for the berth benchmark suite.
//!
//! This crate isolates the inherently fragile text scraping of OS
//! utilities behind two small traits:
//!
//! - [`ProcessMetricSource`]: aggregate CPU% and resident memory of an
//!   engine's processes, scraped from a `ps` pipeline
//! - [`PowerMetricSource`]: instantaneous power attributed to the
//!   engine, either apportioned from system-wide CPU power
//!   (`powermetrics`) or read from a continuously sampled `top` side
//!   file
//!
//! Both traits are infallible by contract: a scrape or parse failure
//! degrades to a zero-valued reading with a warning, never an error.
//! The line parsing itself lives in pure functions tested against
//! captured utility output.

use thiserror::Error;

pub mod power;
pub mod process;
pub mod sampler;

mod pipeline;

// Mock implementations for testing
#[cfg(any(feature = "mock", test))]
pub mod mock;

// Re-export main types
pub use power::{apportion_power, parse_cpu_power_mw, ApportionedPowerSource, PowerMetricSource};
pub use process::{
    parse_ps_totals, ProcessMetricSource, ProcessUsage, PsProcessSource, SystemCpuSource,
};
pub use sampler::TopPowerSampler;

#[cfg(any(feature = "mock", test))]
pub use mock::{FixedPowerSource, FixedProcessSource, ScriptedPowerSource, ScriptedProcessSource};

/// Result type for metric-source setup
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Errors that can occur while setting up metric sources.
///
/// Per-reading failures never surface here; they degrade to zeros.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Failed to spawn sampler pipeline: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
