//! Advisory status messages.
//!
//! The resolver narrates its progress ("trying GET /predict...", "falling
//! back to local") through a [`StatusSink`]. Sinks are observers only.

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info, warn};

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Progress or success.
    Info,
    /// Something was rejected but another route remains.
    Warn,
    /// Remote classification is unavailable.
    Error,
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatusLevel::Info => "info",
            StatusLevel::Warn => "warn",
            StatusLevel::Error => "error",
        })
    }
}

/// One human-readable progress message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Severity.
    pub level: StatusLevel,
    /// Message text.
    pub message: String,
}

impl Status {
    /// Info-level status.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Info, message: message.into() }
    }

    /// Warn-level status.
    #[must_use]
    pub fn warn(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Warn, message: message.into() }
    }

    /// Error-level status.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { level: StatusLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Receiver for advisory status messages.
pub trait StatusSink: Send + Sync {
    /// Handle one message. Must not block.
    fn notify(&self, status: &Status);
}

/// Forwards status messages to `tracing` at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn notify(&self, status: &Status) {
        match status.level {
            StatusLevel::Info => info!(target: "spamz::status", "{}", status.message),
            StatusLevel::Warn => warn!(target: "spamz::status", "{}", status.message),
            StatusLevel::Error => error!(target: "spamz::status", "{}", status.message),
        }
    }
}

/// Keeps every message it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<Status>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn messages(&self) -> Vec<Status> {
        self.messages.lock().clone()
    }

    /// The most recent message, mirroring a single status line.
    #[must_use]
    pub fn last(&self) -> Option<Status> {
        self.messages.lock().last().cloned()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.messages.lock().clear();
    }
}

impl StatusSink for RecordingSink {
    fn notify(&self, status: &Status) {
        self.messages.lock().push(status.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.notify(&Status::info("one"));
        sink.notify(&Status::warn("two"));
        sink.notify(&Status::error("three"));

        let msgs = sink.messages();
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0].level, StatusLevel::Info);
        assert_eq!(sink.last().unwrap().message, "three");

        sink.clear();
        assert!(sink.last().is_none());
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::warn("careful").to_string(), "[warn] careful");
    }
}
