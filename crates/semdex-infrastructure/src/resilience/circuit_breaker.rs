//! Circuit breaker implementation
//!
//! Consecutive-failure breaker guarding the embedding provider. Closed until
//! the failure threshold is hit, open until the recovery timeout elapses,
//! then half-open for exactly one probe: a successful probe closes the
//! circuit and resets the counters, a failed one reopens it.

use crate::constants::{
    CIRCUIT_BREAKER_FAILURE_THRESHOLD, CIRCUIT_BREAKER_HALF_OPEN_MAX_REQUESTS,
    CIRCUIT_BREAKER_RECOVERY_TIMEOUT,
};
use async_trait::async_trait;
use semdex_application::ports::{CircuitBreakerBackend, CircuitBreakerState};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit
    pub failure_threshold: u32,
    /// How long to wait before trying half-open
    pub recovery_timeout: Duration,
    /// Probe calls allowed in the half-open state
    pub half_open_max_requests: u32,
    /// Circuit breaker name
    pub name: String,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            recovery_timeout: CIRCUIT_BREAKER_RECOVERY_TIMEOUT,
            half_open_max_requests: CIRCUIT_BREAKER_HALF_OPEN_MAX_REQUESTS,
            name: "default".to_string(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the failure threshold
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the recovery timeout
    pub fn with_recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }
}

/// In-memory consecutive-failure circuit breaker
///
/// Suitable for a single indexer process; embed workers share one instance.
pub struct ConsecutiveFailureBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitBreakerState>,
    consecutive_failures: AtomicU32,
    opened_at: RwLock<Option<Instant>>,
    half_open_calls: AtomicU32,
}

impl ConsecutiveFailureBreaker {
    /// Create a breaker from configuration
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitBreakerState::Closed),
            consecutive_failures: AtomicU32::new(0),
            opened_at: RwLock::new(None),
            half_open_calls: AtomicU32::new(0),
        }
    }

    /// Create a breaker with default thresholds
    pub fn with_name(name: impl Into<String>) -> Self {
        Self::new(CircuitBreakerConfig::new(name))
    }

    fn should_try_half_open(&self) -> bool {
        if let Ok(opened_at) = self.opened_at.read() {
            if let Some(opened) = *opened_at {
                return opened.elapsed() >= self.config.recovery_timeout;
            }
        }
        false
    }

    fn transition_to(&self, new_state: CircuitBreakerState) {
        if let Ok(mut state) = self.state.write() {
            let old_state = *state;
            if old_state != new_state {
                tracing::info!(
                    circuit_breaker = %self.config.name,
                    from = %old_state,
                    to = %new_state,
                    "circuit breaker state transition"
                );
                *state = new_state;
                match new_state {
                    CircuitBreakerState::Open => {
                        if let Ok(mut opened_at) = self.opened_at.write() {
                            *opened_at = Some(Instant::now());
                        }
                    }
                    CircuitBreakerState::Closed => {
                        self.consecutive_failures.store(0, Ordering::SeqCst);
                        if let Ok(mut opened_at) = self.opened_at.write() {
                            *opened_at = None;
                        }
                    }
                    CircuitBreakerState::HalfOpen => {
                        self.half_open_calls.store(0, Ordering::SeqCst);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl CircuitBreakerBackend for ConsecutiveFailureBreaker {
    fn is_call_permitted(&self) -> bool {
        let state = self
            .state
            .read()
            .map(|s| *s)
            .unwrap_or(CircuitBreakerState::Closed);
        match state {
            CircuitBreakerState::Closed => true,
            CircuitBreakerState::Open => {
                if self.should_try_half_open() {
                    self.transition_to(CircuitBreakerState::HalfOpen);
                    let probe = self.half_open_calls.fetch_add(1, Ordering::SeqCst);
                    probe < self.config.half_open_max_requests
                } else {
                    false
                }
            }
            CircuitBreakerState::HalfOpen => {
                let probe = self.half_open_calls.fetch_add(1, Ordering::SeqCst);
                probe < self.config.half_open_max_requests
            }
        }
    }

    async fn record_success(&self) {
        let state = self
            .state
            .read()
            .map(|s| *s)
            .unwrap_or(CircuitBreakerState::Closed);
        match state {
            CircuitBreakerState::HalfOpen => {
                // probe succeeded, circuit recovers
                self.transition_to(CircuitBreakerState::Closed);
            }
            CircuitBreakerState::Closed => {
                self.consecutive_failures.store(0, Ordering::SeqCst);
            }
            CircuitBreakerState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let state = self
            .state
            .read()
            .map(|s| *s)
            .unwrap_or(CircuitBreakerState::Closed);
        match state {
            CircuitBreakerState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                if failures >= self.config.failure_threshold {
                    self.transition_to(CircuitBreakerState::Open);
                }
            }
            CircuitBreakerState::HalfOpen => {
                // probe failed, back to open
                self.transition_to(CircuitBreakerState::Open);
            }
            CircuitBreakerState::Open => {
                if let Ok(mut opened_at) = self.opened_at.write() {
                    *opened_at = Some(Instant::now());
                }
            }
        }
    }

    fn state(&self) -> CircuitBreakerState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or(CircuitBreakerState::Closed)
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
