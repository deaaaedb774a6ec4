//! Retry configuration and dead letter queue handling.

#![allow(missing_docs)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use masscontact_common::QueueSettings;
use serde::{Deserialize, Serialize};

/// Retry configuration with exponential backoff.
///
/// A worker whose job failed pauses for [`RetryConfig::delay_for_attempt`]
/// before claiming again.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of redeliveries before a job is dead-lettered.
    pub max_retries: u32,
    /// Initial pause after a failure.
    pub initial_delay: Duration,
    /// Maximum pause after a failure.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl From<&QueueSettings> for RetryConfig {
    fn from(settings: &QueueSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_millis(settings.retry_backoff_ms),
            ..Default::default()
        }
    }
}

impl RetryConfig {
    /// No redelivery pause; used by tests draining queues inline.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Calculate delay for the given attempt number (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt >= self.max_retries {
            return self.max_delay;
        }

        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs).map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Whether a job that already failed `attempt` times may be redelivered.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Dead letter queue entry for failed jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetterEntry<T> {
    /// The failed job.
    pub job: T,
    /// Number of attempts made.
    pub attempts: u32,
    /// Last error message.
    pub last_error: String,
    /// Timestamp of last failure.
    pub failed_at: DateTime<Utc>,
}

impl<T> DeadLetterEntry<T> {
    /// Create a new dead letter entry.
    pub fn new(job: T, attempts: u32, error: String) -> Self {
        Self {
            job,
            attempts,
            last_error: error,
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_backoff() {
        let config = RetryConfig::default();

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay() {
        let config = RetryConfig {
            max_retries: 10,
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(5), Duration::from_secs(60));
    }

    #[test]
    fn test_large_attempt_is_capped() {
        let config = RetryConfig {
            max_retries: 1000,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(70), Duration::from_secs(60));
        assert_eq!(config.delay_for_attempt(999), Duration::from_secs(60));
    }

    #[test]
    fn test_should_retry() {
        let config = RetryConfig::immediate(2);

        assert!(config.should_retry(0));
        assert!(config.should_retry(1));
        assert!(!config.should_retry(2));
        assert_eq!(config.delay_for_attempt(1), Duration::ZERO);
    }
}
