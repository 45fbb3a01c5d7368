//! Configuration for transfer runs.

use flowpull_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options applied to every run of an orchestrator.
#[derive(PartialEq, Clone, Debug, Default, Deserialize, Serialize)]
pub struct TransferOptions {
    /// Deadline applied to each remote suspension point (connect, list,
    /// per-file download, per-file upload). Accepts human-readable
    /// durations like "30s". Unset means no deadline.
    #[serde(default, with = "humantime_serde")]
    pub operation_timeout: Option<Duration>,

    /// Bounded per-file retry. Unset means a single attempt per file.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options: TransferOptions = serde_yaml::from_str("{}").unwrap();
        assert_eq!(options, TransferOptions::default());
        assert!(options.operation_timeout.is_none());
        assert!(options.retry.is_none());
    }

    #[test]
    fn test_deserialize_humantime_timeout() {
        let yaml = r#"
            operation_timeout: "30s"
            retry:
              max_attempts: 3
              initial_backoff: "250ms"
        "#;
        let options: TransferOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.operation_timeout, Some(Duration::from_secs(30)));

        let retry = options.retry.unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_backoff, Duration::from_millis(250));
    }
}
