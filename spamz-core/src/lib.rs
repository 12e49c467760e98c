//! # SPAMZ Core Library
//!
//! Transport-free building blocks for the SPAMZ classification client:
//!
//! - [`Payload`] / [`ClassificationResult`] / [`Resolution`]: the data model
//! - [`classifier`]: the deterministic keyword heuristic used when no
//!   remote endpoint answers
//! - [`config`]: `spamz.toml` loading and validation
//! - [`metrics`]: lock-free counters for resolution outcomes
//!
//! The network side lives in `spamz-client`.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use classifier::classify_locally;
pub use config::SpamzConfig;
pub use error::SpamzError;
pub use types::*;
