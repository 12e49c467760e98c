//! Configuration for the SPAMZ client.
//!
//! Maps directly to `spamz.toml`. Every field has a default, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpamzError};

/// Top-level SPAMZ configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpamzConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Remote classification endpoint.
    #[serde(default)]
    pub endpoint: EndpointConfig,
}

impl SpamzConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `SpamzError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| SpamzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check values that serde cannot.
    ///
    /// # Errors
    /// Returns `SpamzError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.general.validate()?;
        self.endpoint.validate()
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, coloured when attached to a terminal.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default filter directive: trace, debug, info, warn, error.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl GeneralConfig {
    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(SpamzError::Config("general.log_level must not be empty".into()));
        }
        Ok(())
    }
}

/// Where the classification service lives and which routes to probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Scheme, host and port of the service. Must not carry a path: routes
    /// are absolute and replace it when joined.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Route tried first (POST, then GET).
    #[serde(default = "default_primary_route")]
    pub primary_route: String,
    /// Route tried when the primary one is rejected.
    #[serde(default = "default_secondary_route")]
    pub secondary_route: String,
    /// Per-request timeout in milliseconds. Unset leaves timeouts to the
    /// transport.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            primary_route: default_primary_route(),
            secondary_route: default_secondary_route(),
            request_timeout_ms: None,
        }
    }
}

impl EndpointConfig {
    /// Point the endpoint at a different service, keeping the routes.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(SpamzError::Config("endpoint.base_url must not be empty".into()));
        }
        if base_url_has_path(&self.base_url) {
            return Err(SpamzError::Config(format!(
                "endpoint.base_url must be scheme, host and port only, got '{}'; put the path in the routes",
                self.base_url
            )));
        }
        for (name, route) in [
            ("primary_route", &self.primary_route),
            ("secondary_route", &self.secondary_route),
        ] {
            if !route.starts_with('/') {
                return Err(SpamzError::Config(format!(
                    "endpoint.{name} must start with '/', got '{route}'"
                )));
            }
        }
        if self.request_timeout_ms == Some(0) {
            return Err(SpamzError::Config(
                "endpoint.request_timeout_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Anything beyond a bare trailing `/` after the authority.
fn base_url_has_path(base_url: &str) -> bool {
    let rest = base_url.split_once("://").map_or(base_url, |(_, rest)| rest);
    rest.find(['/', '?', '#'])
        .is_some_and(|i| !rest[i..].trim_end_matches('/').is_empty())
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_log_level() -> String { "info".to_string() }
fn default_base_url() -> String { "http://127.0.0.1:8000".to_string() }
fn default_primary_route() -> String { "/predict".to_string() }
fn default_secondary_route() -> String { "/api/predict".to_string() }
