//! Retry backoff policies

use std::time::Duration;

/// Exponential backoff with an upper bound
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// First delay
    pub initial: Duration,
    /// Ceiling on any delay
    pub max: Duration,
}

impl BackoffPolicy {
    /// Delay before the given 1-based retry attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Embed retry delay: `min(2^attempt, 5)` seconds for a 1-based attempt
pub fn embed_retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).min(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backoff_doubles_and_caps() {
        let policy = BackoffPolicy {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(5000),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(8), Duration::from_millis(5000));
    }

    #[test]
    fn embed_backoff_caps_at_five_seconds() {
        assert_eq!(embed_retry_delay(1), Duration::from_secs(2));
        assert_eq!(embed_retry_delay(2), Duration::from_secs(4));
        assert_eq!(embed_retry_delay(3), Duration::from_secs(5));
        assert_eq!(embed_retry_delay(10), Duration::from_secs(5));
    }
}
