//! Configuration types

mod discovery;
mod indexing;
mod logging;
mod resilience;

pub use discovery::DiscoveryConfig;
pub use indexing::IndexingConfig;
pub use logging::LoggingConfig;
pub use resilience::ResilienceConfig;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Pipeline sizing
    #[serde(default)]
    #[validate(nested)]
    pub indexing: IndexingConfig,
    /// Discovery filters
    #[serde(default)]
    #[validate(nested)]
    pub discovery: DiscoveryConfig,
    /// Circuit breaker and rate limiter tuning
    #[serde(default)]
    #[validate(nested)]
    pub resilience: ResilienceConfig,
    /// Logging setup
    #[serde(default)]
    pub logging: LoggingConfig,
}
