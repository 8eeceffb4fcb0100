//! Sliding-window rate limiter
//!
//! Counts requests over a rolling one-minute window. When the cap is hit the
//! caller receives a refusal without the provider ever being contacted; the
//! embed worker turns that refusal into a transient `RateLimited` error.

use crate::constants::{RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW};
use semdex_application::ports::RateLimiterBackend;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Sliding one-minute request counter
pub struct SlidingWindowRateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowRateLimiter {
    /// Create a limiter with the default cap (60 requests per minute)
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT_MAX_REQUESTS, RATE_LIMIT_WINDOW)
    }

    /// Create a limiter with an explicit cap and window
    pub fn with_limits(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Requests currently counted inside the window
    pub fn current_load(&self) -> usize {
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        while timestamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            timestamps.pop_front();
        }
        timestamps.len()
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterBackend for SlidingWindowRateLimiter {
    fn try_acquire(&self) -> bool {
        let mut timestamps = match self.timestamps.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        while timestamps
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            timestamps.pop_front();
        }
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn admits_up_to_the_cap() {
        let limiter = SlidingWindowRateLimiter::with_limits(3, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert_eq!(limiter.current_load(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides() {
        let limiter = SlidingWindowRateLimiter::with_limits(2, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.try_acquire());
        assert_eq!(limiter.current_load(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn partial_expiry_frees_partial_capacity() {
        let limiter = SlidingWindowRateLimiter::with_limits(2, Duration::from_secs(60));
        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // first request expires, second is still inside the window
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
