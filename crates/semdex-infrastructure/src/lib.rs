//! Semdex infrastructure layer
//!
//! Concrete implementations behind the application-layer ports: the
//! consecutive-failure circuit breaker and sliding-window rate limiter, the
//! per-file lock registry, configuration loading, and logging bootstrap.

pub mod config;
pub mod constants;
pub mod locks;
pub mod logging;
pub mod progress;
pub mod resilience;

pub use config::{AppConfig, ConfigLoader};
pub use locks::FileLockRegistry;
pub use logging::init_logging;
pub use progress::TracingProgressSink;
pub use resilience::{CircuitBreakerConfig, ConsecutiveFailureBreaker, SlidingWindowRateLimiter};
