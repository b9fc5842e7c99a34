//! Delay schedule between attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::TransportConfig;

/// Exponential backoff: `base · 2^(retry-1)` capped at `max`, plus up to
/// `jitter` of the capped delay so clients that failed together spread out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    jitter: f64,
}

impl Backoff {
    pub const DEFAULT_JITTER: f64 = 0.1;

    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter: Self::DEFAULT_JITTER,
        }
    }

    /// `retry_delay_ms` as the base, `max_retry_delay_ms` as the cap.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(
            Duration::from_millis(config.retry_delay_ms),
            Duration::from_millis(config.max_retry_delay_ms),
        )
    }

    /// Jitter as a fraction of the delay, clamped to `[0, 1]`.
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn base(&self) -> Duration {
        self.base
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Wait before retry number `retry` (1 is the first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        let capped = self.base.saturating_mul(factor).min(self.max);
        if self.jitter <= 0.0 || capped.is_zero() {
            return capped;
        }

        let spread = rand::thread_rng().gen_range(0.0..self.jitter);
        capped + capped.mul_f64(spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_delay_doubles_per_retry() {
        let backoff = Backoff::new(ms(100), ms(2000)).with_jitter(0.0);
        assert_eq!(backoff.delay(1), ms(100));
        assert_eq!(backoff.delay(2), ms(200));
        assert_eq!(backoff.delay(3), ms(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = Backoff::new(ms(100), ms(1000));
        let d = backoff.delay(10);
        assert!(d >= ms(1000) && d < ms(1100));

        // Shift overflow saturates instead of panicking
        let d = backoff.delay(200);
        assert!(d >= ms(1000) && d < ms(1100));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let backoff = Backoff::new(ms(1000), ms(10_000)).with_jitter(0.5);
        for _ in 0..50 {
            let d = backoff.delay(1);
            assert!(d >= ms(1000) && d < ms(1500));
        }
    }

    #[test]
    fn test_no_retry_no_delay() {
        assert_eq!(Backoff::new(ms(100), ms(1000)).delay(0), Duration::ZERO);
    }

    #[test]
    fn test_from_config_uses_transport_knobs() {
        let config = TransportConfig {
            retry_delay_ms: 250,
            max_retry_delay_ms: 100,
            ..TransportConfig::default()
        };
        let backoff = Backoff::from_config(&config);
        assert_eq!(backoff.base(), ms(250));
        // A cap below the base is raised to the base
        assert_eq!(backoff.max(), ms(250));
    }
}
