//! Configuration loader
//!
//! Merges configuration from defaults, an optional TOML file, and
//! `SEMDEX_`-prefixed environment variables, later sources overriding
//! earlier ones.

use crate::config::AppConfig;
use crate::constants::{CONFIG_ENV_PREFIX, DEFAULT_CONFIG_FILE};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use semdex_domain::{Error, Result};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Configuration loader service
#[derive(Clone, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Create a loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Load configuration from all sources
    ///
    /// Sources are merged in this order (later overrides earlier):
    /// 1. `AppConfig::default()`
    /// 2. TOML file (explicit path, or `semdex.toml` when present)
    /// 3. Environment variables (e.g. `SEMDEX_INDEXING__PARSE_WORKERS`)
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        match &self.config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::not_found(format!(
                        "config file: {}",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                // optional default file
                figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
            }
        }

        let prefix = self.env_prefix.clone().unwrap_or_else(|| CONFIG_ENV_PREFIX.to_string());
        figment = figment.merge(Env::prefixed(&prefix).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| Error::validation(format!("configuration: {}", e)))?;
        config
            .validate()
            .map_err(|e| Error::validation(format!("configuration: {}", e)))?;
        tracing::debug!("configuration loaded");
        Ok(config)
    }
}
