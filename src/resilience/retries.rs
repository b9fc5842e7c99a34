//! Retry bookkeeping for one logical request.

use std::time::Duration;

use crate::config::TransportConfig;
use crate::resilience::backoff::Backoff;

/// Per-request retry state.
///
/// `max_attempts` counts every attempt including the first, so a context built
/// with `max_attempts = 3` allows two retries.
#[derive(Debug, Clone)]
pub struct RetryContext {
    attempt: u32,
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryContext {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            attempt: 1,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.retry_attempts, Backoff::from_config(config))
    }

    /// The attempt currently in flight (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Advance to the next attempt and return how long to wait before it.
    ///
    /// Returns `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.backoff.delay(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}
