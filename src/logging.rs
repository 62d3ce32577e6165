//! Logging setup.
//!
//! Structured diagnostics via `tracing`, written to stderr so the stable
//! progress lines on stdout stay parseable. The filter comes from the
//! `TREESEAL_LOG` environment variable when set, otherwise from the given
//! level (default `warn`).

use crate::error::SealError;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TREESEAL_LOG";
const DEFAULT_LEVEL: &str = "warn";

/// Initialize the global tracing subscriber. Call once, early.
pub fn init_logging(level: Option<&str>) -> Result<(), SealError> {
    let filter = match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level.unwrap_or(DEFAULT_LEVEL))
            .map_err(|e| SealError::Config(format!("invalid log level: {}", e)))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| SealError::Config(format!("failed to initialize logging: {}", e)))?;

    Ok(())
}
