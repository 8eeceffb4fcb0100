//! Logging configuration

use serde::{Deserialize, Serialize};

/// How the tracing subscriber is set up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level when the env filter is unset
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON instead of human-readable lines
    #[serde(default)]
    pub json_format: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json_format: false,
        }
    }
}
