//! # berth-engine
//!
//! Lifecycle and workload adapters for the container engines under test.
//!
//! This crate provides:
//! - The [`EngineAdapter`] trait: one capability set per engine
//!   (liveness, start/stop, readiness, idle/load workloads)
//! - Concrete adapters for the desktop-app engines and colima
//! - Subprocess plumbing shared by the adapters
//! - A scriptable mock adapter for tests
//!
//! Engines are driven entirely through external commands: their own CLIs
//! for readiness probes and workloads, `open`/AppleScript for the desktop
//! apps, and the OS process table for liveness. Engine-specific behavior
//! lives behind the adapter trait; callers never branch on the engine id.
//!
//! ## Example
//!
//! ```rust,no_run
//! use berth_core::Engine;
//! use berth_engine::{adapter_for, EngineAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = adapter_for(Engine::DockerDesktop);
//!
//!     if !adapter.is_running().await {
//!         adapter.start().await?;
//!     }
//!
//!     let ready = adapter.check_ready(std::time::Duration::from_secs(300)).await;
//!     println!("ready: {}", ready);
//!     Ok(())
//! }
//! ```

use thiserror::Error;

pub mod adapter;
pub mod colima;
pub mod command;
pub mod desktop;

// Mock implementation for testing
#[cfg(any(feature = "mock", test))]
pub mod mock;

// Re-export main types
pub use adapter::{adapter_for, EngineAdapter};
pub use colima::Colima;
pub use desktop::DesktopApp;

#[cfg(any(feature = "mock", test))]
pub use mock::MockEngineAdapter;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving an engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with status {status:?}: {stderr}")]
    Command {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
