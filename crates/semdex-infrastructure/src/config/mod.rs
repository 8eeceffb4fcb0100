//! Configuration loading and types

mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{AppConfig, DiscoveryConfig, IndexingConfig, LoggingConfig, ResilienceConfig};
