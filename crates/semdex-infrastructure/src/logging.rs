//! Structured logging with tracing
//!
//! Centralized subscriber setup. The `SEMDEX_LOG` environment variable takes
//! precedence over the configured level, so operators can raise verbosity
//! without touching configuration files.

use crate::config::LoggingConfig;
use crate::constants::LOG_FILTER_ENV;
use semdex_domain::{Error, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Initialize logging with the provided configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = create_log_filter(&config.level);
    let registry = Registry::default().with(filter);
    let result = if config.json_format {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| Error::validation(format!("logging init: {}", e)))?;
    tracing::info!(level = %config.level, json = config.json_format, "logging initialized");
    Ok(())
}

/// Create the log filter, preferring the environment over configuration
fn create_log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}
