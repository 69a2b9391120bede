//! Bounded retry with exponential backoff.

use std::time::Duration;

use gigwatch_core::config::WatcherConfig;

/// Ceiling on any single retry delay, whatever the configured factor.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// How many times a cycle may run and how long to wait between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.retry_initial_backoff_ms),
            backoff_factor: config.retry_backoff_factor,
        }
    }

    /// Delay before the next attempt, given how many attempts have failed.
    ///
    /// The first retry waits `initial_backoff`; each later retry multiplies
    /// the previous delay by `backoff_factor`. Delays never exceed
    /// `MAX_BACKOFF`, so a runaway factor degrades to a long wait instead
    /// of an overflow.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_factor.powi(exponent).max(0.0);
        let delay_ms = (self.initial_backoff.as_millis() as f64 * factor)
            .min(MAX_BACKOFF.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, initial_ms: u64, factor: f64) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(initial_ms),
            backoff_factor: factor,
        }
    }

    #[test]
    fn delays_double_with_factor_two() {
        let policy = policy(3, 1000, 2.0);
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[test]
    fn factor_one_keeps_delay_constant() {
        let policy = policy(5, 500, 1.0);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(4), Duration::from_millis(500));
    }

    #[test]
    fn extreme_factor_caps_the_delay_instead_of_panicking() {
        let policy = policy(10, 60_000, f64::MAX);
        assert_eq!(policy.delay_for(9), Duration::from_secs(60));
    }

    #[test]
    fn negative_factor_degrades_to_zero_delay() {
        let policy = policy(3, 1000, -2.0);
        assert_eq!(policy.delay_for(2), Duration::ZERO);
    }

    #[test]
    fn from_config_floors_attempts_at_one() {
        let config = WatcherConfig {
            poll_interval_secs: 180,
            retry_max_attempts: 0,
            retry_initial_backoff_ms: 1000,
            retry_backoff_factor: 2.0,
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }
}
