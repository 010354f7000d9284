//! Wait between poll cycles
//!
//! While checks succeed the poller waits the plain poll interval. Each
//! consecutive failure doubles the wait, capped at the configured maximum,
//! with random jitter on top. The first successful check resets it.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff over consecutive failed checks
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    /// Jitter factor (0.0 to 1.0)
    jitter_factor: f64,
    failures: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter_factor: jitter_factor.clamp(0.0, 1.0),
            failures: 0,
        }
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
    }

    /// Number of consecutive failed checks
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// `base * 2^failures`, capped at `max`
    fn capped_delay(&self) -> Duration {
        let factor = 2u32.checked_pow(self.failures).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// How long to wait before the next check
    pub fn next_delay(&self) -> Duration {
        if self.failures == 0 {
            return self.base;
        }

        let delay = self.capped_delay();
        if self.jitter_factor == 0.0 {
            return delay;
        }

        let delay_ms = delay.as_millis() as u64;
        let jitter_range_ms = (delay_ms as f64 * self.jitter_factor) as u64;
        let jitter_ms = if jitter_range_ms > 0 {
            rand::thread_rng().gen_range(0..=jitter_range_ms)
        } else {
            0
        };

        Duration::from_millis(delay_ms + jitter_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_healthy_wait_is_base_interval() {
        let backoff = Backoff::new(secs(60), secs(1800), 0.1);
        assert_eq!(backoff.next_delay(), secs(60));
    }

    #[test]
    fn test_doubles_per_failure_and_caps() {
        let mut backoff = Backoff::new(secs(60), secs(600), 0.0);
        let mut delays = Vec::new();
        for _ in 0..6 {
            backoff.record_failure();
            delays.push(backoff.next_delay().as_secs());
        }
        assert_eq!(delays, vec![120, 240, 480, 600, 600, 600]);
    }

    #[test]
    fn test_success_resets() {
        let mut backoff = Backoff::new(secs(60), secs(600), 0.0);
        backoff.record_failure();
        backoff.record_failure();
        assert_eq!(backoff.failures(), 2);

        backoff.record_success();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), secs(60));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let mut backoff = Backoff::new(secs(60), secs(1800), 0.1);
        backoff.record_failure();
        for _ in 0..50 {
            let delay = backoff.next_delay();
            assert!(delay >= secs(120), "delay {:?} below base", delay);
            assert!(delay <= Duration::from_millis(132_000), "delay {:?} above jitter", delay);
        }
    }

    #[test]
    fn test_many_failures_do_not_overflow() {
        let mut backoff = Backoff::new(secs(60), secs(1800), 0.0);
        for _ in 0..200 {
            backoff.record_failure();
        }
        assert_eq!(backoff.next_delay(), secs(1800));
    }
}
