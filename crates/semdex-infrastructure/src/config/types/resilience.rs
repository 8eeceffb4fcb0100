//! Resilience configuration

use crate::constants::{
    CIRCUIT_BREAKER_FAILURE_THRESHOLD, CIRCUIT_BREAKER_RECOVERY_TIMEOUT,
    RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Circuit breaker and rate limiter tuning
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResilienceConfig {
    /// Consecutive failures before the circuit opens
    #[serde(default = "default_failure_threshold")]
    #[validate(range(min = 1))]
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before a half-open probe
    #[serde(default = "default_recovery_timeout_secs")]
    #[validate(range(min = 1))]
    pub recovery_timeout_secs: u64,
    /// Requests admitted per rate-limit window
    #[serde(default = "default_rate_limit")]
    #[validate(range(min = 1))]
    pub rate_limit_max_requests: usize,
    /// Rate-limit window in seconds
    #[serde(default = "default_rate_window_secs")]
    #[validate(range(min = 1))]
    pub rate_limit_window_secs: u64,
}

fn default_failure_threshold() -> u32 {
    CIRCUIT_BREAKER_FAILURE_THRESHOLD
}
fn default_recovery_timeout_secs() -> u64 {
    CIRCUIT_BREAKER_RECOVERY_TIMEOUT.as_secs()
}
fn default_rate_limit() -> usize {
    RATE_LIMIT_MAX_REQUESTS
}
fn default_rate_window_secs() -> u64 {
    RATE_LIMIT_WINDOW.as_secs()
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            rate_limit_max_requests: default_rate_limit(),
            rate_limit_window_secs: default_rate_window_secs(),
        }
    }
}
