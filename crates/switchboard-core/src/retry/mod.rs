//! Backoff schedule for retrying transient failures.
//!
//! Pure computation: given an attempt index, decide whether to retry and how
//! long to wait. Only `Timeout` and generic transient failures consume a
//! backoff sleep; rate limits rotate to a different credential instead.

#[cfg(test)]
mod tests;

use rand::Rng;
use std::time::Duration;

use switchboard_types::RetryConfig;

/// Exponential backoff with optional uniform jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, jitter: bool) -> Self {
        Self { max_attempts, base_delay, max_delay, jitter }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry following failed attempt `attempt` (zero-based),
    /// or `None` when no attempts remain.
    ///
    /// Schedule: `min(base * 2^attempt, max)`, optionally jittered uniformly
    /// over `[0, delay]` to desynchronize concurrent retriers.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt.saturating_add(1) >= self.max_attempts {
            return None;
        }

        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        // Shift saturates well past any real max_delay
        let scheduled_ms = base_ms.saturating_mul(1u64 << attempt.min(20)).min(max_ms);

        let delay_ms = if self.jitter {
            rand::thread_rng().gen_range(0..=scheduled_ms)
        } else {
            scheduled_ms
        };

        Some(Duration::from_millis(delay_ms))
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter,
        )
    }
}
