//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::BackpressureConfig;

/// Calculate exponential backoff delay with jitter.
///
/// Attempt 0 waits nothing; attempt `n` waits `base * 2^(n-1)` capped at
/// `max`, plus up to 10% jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let capped_delay = base_ms.saturating_mul(exponential_base).min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// How many times, and how long, to wait on a socket that is not ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based), or `None` once the bound is reached.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.max_attempts {
            return None;
        }
        Some(calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&BackpressureConfig::default())
    }
}

impl From<&BackpressureConfig> for BackoffPolicy {
    fn from(config: &BackpressureConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}
