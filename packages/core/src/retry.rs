//! Retry strategies for registry calls.

use std::time::Duration;

/// Exponential backoff schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(64),
            multiplier: 2.0,
        }
    }
}

impl Backoff {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            ..Default::default()
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Delay to wait before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// How a registry call reacts to transient failures.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Surface the first transient failure.
    JustDont,
    /// Retry forever, backing off exponentially.
    WithInfiniteExpBackOff(Backoff),
}

impl RetryStrategy {
    /// Infinite retry with the default backoff schedule.
    pub fn infinite() -> Self {
        RetryStrategy::WithInfiniteExpBackOff(Backoff::default())
    }

    /// Delay before retry number `attempt`, or `None` to give up.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        match self {
            RetryStrategy::JustDont => None,
            RetryStrategy::WithInfiniteExpBackOff(backoff) => Some(backoff.delay(attempt)),
        }
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::infinite()
    }
}
