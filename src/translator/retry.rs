//! Retry and pacing policies for backend calls.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::TranslatorConfig;

/// Bounded attempts with exponential backoff: `base`, `2·base`, `4·base`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Calls per key, including the first.
    max_attempts: u32,
    /// Delay after the first failure.
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is at least one.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    /// Policy from `maxAttempts` and `baseDelayMs`.
    #[must_use]
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.base_delay_ms))
    }

    /// Calls per key, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait after `failed_attempts` consecutive failures (1-based).
    #[must_use]
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Enforces a minimum interval between the starts of consecutive calls.
#[derive(Debug)]
pub struct Pacer {
    /// Minimum spacing of call starts.
    interval: Duration,
    /// Earliest start of the next call; `None` before the first call.
    next_allowed: Option<Instant>,
}

impl Pacer {
    /// Pacer whose first call starts immediately.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval, next_allowed: None }
    }

    /// Sleeps until the next call may start, then reserves the following slot.
    pub async fn wait(&mut self) {
        if let Some(next) = self.next_allowed {
            tokio::time::sleep_until(next).await;
        }
        self.next_allowed = Some(Instant::now() + self.interval);
    }
}
