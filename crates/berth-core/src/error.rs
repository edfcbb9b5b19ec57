//! Error handling for berth core types

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while validating benchmark inputs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
