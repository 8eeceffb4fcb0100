//! Resilience ports
//!
//! The embed workers consult these seams before every provider call.
//! Implementations live in the infrastructure layer; tests substitute
//! always-allow stand-ins.

use async_trait::async_trait;
use std::sync::Arc;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitBreakerState {
    /// Requests pass; failures are counted
    Closed,
    /// Requests are rejected until the recovery timeout elapses
    Open,
    /// One probe request is allowed through
    HalfOpen,
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Circuit breaker guarding the embedding provider
#[async_trait]
pub trait CircuitBreakerBackend: Send + Sync {
    /// Whether a call may proceed right now
    ///
    /// An open breaker past its recovery timeout transitions to half-open and
    /// admits exactly one probe.
    fn is_call_permitted(&self) -> bool;

    /// Record a successful provider call
    async fn record_success(&self);

    /// Record a failed provider call
    async fn record_failure(&self);

    /// Current state
    fn state(&self) -> CircuitBreakerState;

    /// Breaker name for logs
    fn name(&self) -> &str;
}

/// Shared circuit breaker handle
pub type SharedCircuitBreaker = Arc<dyn CircuitBreakerBackend>;

/// Request rate limiter consulted before provider calls
pub trait RateLimiterBackend: Send + Sync {
    /// Try to take one slot; `false` means the caller must back off
    fn try_acquire(&self) -> bool;
}

/// Shared rate limiter handle
pub type SharedRateLimiter = Arc<dyn RateLimiterBackend>;

/// Circuit breaker that always allows calls (no-op implementation)
pub struct NullCircuitBreaker {
    name: String,
}

impl NullCircuitBreaker {
    /// Create a new null circuit breaker
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl CircuitBreakerBackend for NullCircuitBreaker {
    fn is_call_permitted(&self) -> bool {
        true
    }

    async fn record_success(&self) {}

    async fn record_failure(&self) {}

    fn state(&self) -> CircuitBreakerState {
        CircuitBreakerState::Closed
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Rate limiter that never refuses (no-op implementation)
#[derive(Debug, Default)]
pub struct NullRateLimiter;

impl RateLimiterBackend for NullRateLimiter {
    fn try_acquire(&self) -> bool {
        true
    }
}
