//! Retry configuration for transfer operations.
//!
//! Provides exponential backoff with jitter. Attempts are bounded: a
//! transfer run must terminate, so the default is a single attempt (no
//! retry) and callers opt in to more.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};

/// Default number of attempts (no retry).
pub const DEFAULT_MAX_ATTEMPTS: usize = 1;

/// Default initial backoff delay (1 second).
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded retry configuration with exponential backoff and jitter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total number of attempts for one retried unit, including the first.
    /// 1 disables retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Initial backoff delay (default: "1s"). Accepts human-readable
    /// durations like "500ms", "2s", "1m". Each subsequent retry doubles
    /// this delay with jitter applied.
    #[serde(default = "default_initial_backoff", with = "humantime_serde")]
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryConfig {
    /// Creates a tokio-retry strategy with exponential backoff and jitter.
    ///
    /// The iterator yields one delay per retry, so `max_attempts - 1`
    /// delays in total.
    pub fn strategy(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let initial_ms = self.initial_backoff.as_millis() as u64;

        // ExponentialBackoff uses base^n * factor. With base=2 and
        // factor=initial_ms/2 the first delay equals initial_ms. The clamp
        // keeps sub-2ms backoff values from truncating to a zero factor,
        // which would disable all delay between retries.
        let factor = (initial_ms / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2).factor(factor).map(jitter);

        Box::new(strategy.take(self.max_attempts.saturating_sub(1)))
    }
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_initial_backoff() -> Duration {
    DEFAULT_INITIAL_BACKOFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.initial_backoff, DEFAULT_INITIAL_BACKOFF);
    }

    #[test]
    fn test_default_strategy_yields_no_delays() {
        let delays: Vec<Duration> = RetryConfig::default().strategy().collect();
        assert!(delays.is_empty());
    }

    #[test]
    fn test_strategy_is_bounded() {
        let config = RetryConfig {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(100),
        };

        let delays: Vec<Duration> = config.strategy().collect();
        assert_eq!(delays.len(), 3); // max_attempts - 1
        for delay in &delays {
            assert!(*delay > Duration::ZERO);
        }
    }

    #[test]
    fn test_strategy_sub_2ms_does_not_produce_zero_delays() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1),
        };
        for delay in config.strategy() {
            assert!(delay > Duration::ZERO, "delay must not be zero");
        }
    }

    #[test]
    fn test_deserialize_humantime() {
        let yaml = r#"
            max_attempts: 3
            initial_backoff: "500ms"
        "#;
        let config: RetryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: RetryConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());
    }
}
