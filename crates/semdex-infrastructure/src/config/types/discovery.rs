//! Discovery filter configuration

use semdex_application::constants::{
    DEFAULT_EXCLUDED_DIRS, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE,
};
use semdex_application::discovery::DiscoveryOptions;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// What discovery includes and excludes
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DiscoveryConfig {
    /// File extensions to index (without dots)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Glob patterns a relative path must match
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Glob patterns that exclude a relative path
    #[serde(default = "default_excludes")]
    pub exclude_patterns: Vec<String>,
    /// Maximum file size in bytes
    #[serde(default = "default_max_file_size")]
    #[validate(range(min = 1))]
    pub max_file_size: u64,
    /// Follow symbolic links
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect()
}

fn default_excludes() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS
        .iter()
        .map(|dir| format!("**/{}/**", dir))
        .collect()
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            include_patterns: Vec::new(),
            exclude_patterns: default_excludes(),
            max_file_size: default_max_file_size(),
            follow_symlinks: false,
        }
    }
}

impl From<&DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            include_patterns: config.include_patterns.clone(),
            exclude_patterns: config.exclude_patterns.clone(),
            max_file_size: Some(config.max_file_size),
            follow_symlinks: config.follow_symlinks,
        }
    }
}
