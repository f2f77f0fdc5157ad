//! Error types for ashare-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid price '{input}': {source}")]
    InvalidPrice {
        input: String,
        source: rust_decimal::Error,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
