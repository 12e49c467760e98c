//! Client error types.

use thiserror::Error;

/// A request that never produced an HTTP response.
///
/// DNS failures, refused connections, resets and timeouts all land here;
/// callers treat them as a single class.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError(format!("timed out: {err}"))
        } else if err.is_connect() {
            TransportError(format!("connection failed: {err}"))
        } else {
            TransportError(err.to_string())
        }
    }
}

/// Errors that can occur while talking to the classification service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with a non-2xx status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The response body was not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(String),

    /// A route could not be combined with the configured base URL.
    #[error("invalid route '{route}': {reason}")]
    InvalidRoute {
        /// The offending route or base URL.
        route: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ClientError {
    /// Whether this is the "method not allowed" status.
    #[must_use]
    pub fn is_method_not_allowed(&self) -> bool {
        matches!(self, ClientError::HttpStatus(405))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
