//! Ports the application layer declares for infrastructure to implement

mod locks;
mod resilience;

pub use locks::{FileLockProvider, LockGuard, SharedFileLockProvider};
pub use resilience::{
    CircuitBreakerBackend, CircuitBreakerState, NullCircuitBreaker, NullRateLimiter,
    RateLimiterBackend, SharedCircuitBreaker, SharedRateLimiter,
};
