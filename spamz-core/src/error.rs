//! Error types for the SPAMZ core library.

use thiserror::Error;

/// Top-level error type for SPAMZ core operations.
///
/// Classification itself cannot fail; these cover loading and validating
/// configuration.
#[derive(Error, Debug)]
pub enum SpamzError {
    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SpamzError {
    fn from(err: serde_json::Error) -> Self {
        SpamzError::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SpamzError>;
