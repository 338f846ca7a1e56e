//! Retry policy with exponential backoff for transient download failures.

use std::time::Duration;

use rand::Rng;

use crate::config::Config;
use crate::error::DownloadError;

/// Default attempts per asset, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(8);

/// Jitter added on top of each delay, as a fraction of it.
const JITTER_FRACTION: f64 = 0.2;

/// How often and how patiently a failed asset is retried.
///
/// Only [`DownloadError::Transient`] failures are retried. The delay before retry
/// `n` is `base_delay * 2^(n-1)`, capped at `max_delay`, plus up to 20% jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.download.max_attempts,
            Duration::from_millis(config.download.base_delay_ms),
            Duration::from_millis(config.download.max_delay_ms),
        )
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff before the retry following failed attempt `attempt` (1-indexed), without jitter.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay before the next attempt, or `None` when the failure should be final.
    pub fn next_delay(&self, error: &DownloadError, attempt: u32) -> Option<Duration> {
        if !error.is_transient() || attempt >= self.max_attempts {
            return None;
        }

        let delay = self.backoff(attempt);
        let jitter_ms = (delay.as_millis() as f64 * JITTER_FRACTION) as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
        } else {
            Duration::ZERO
        };
        Some(delay + jitter)
    }
}
