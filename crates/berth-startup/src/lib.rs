//! # berth-startup
//!
//! The startup prober: measures an engine's cold-start latency across N
//! repetitions, tolerating bounded in-attempt retries.
//!
//! Each repetition ensures the engine is stopped, issues its native
//! start command, and polls readiness (the engine's CLI answering `info`
//! and `ps`) with up to two additional retries before abandoning the
//! attempt. Only successful attempts enter the summary; a run with zero
//! successes produces no summary file and reports failure by value.
//!
//! ## Example
//!
//! ```rust,no_run
//! use berth_core::{Engine, StartupConfig};
//! use berth_startup::StartupProber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StartupConfig::new(Engine::Orbstack).with_repeat_count(5);
//!     let mut prober = StartupProber::new(config)?;
//!     let outcome = prober.run().await?;
//!     println!("succeeded: {}", outcome.summary.is_some());
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod prober;
pub mod report;

// Re-export main types
pub use prober::{AttemptPhase, StartupOutcome, StartupProber};

/// Result type for startup-probe operations
pub type Result<T> = std::result::Result<T, StartupError>;

/// Errors that can occur while running the prober.
///
/// Failed measurements are not errors; these cover configuration and
/// result-persistence problems only.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] berth_core::Error),

    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
