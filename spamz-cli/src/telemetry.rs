//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use spamz_core::config::{GeneralConfig, LogFormat};

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for results. `RUST_LOG` wins over `general.log_level`.
pub fn init(general: &GeneralConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&general.log_level))?;

    let result = match general.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("tracing init failed: {e}"))
}
