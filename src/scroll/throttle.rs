//! Adaptive request throttling
//!
//! The pause before each continuation request is the previous request's
//! duration multiplied by the throttle factor, so the load follows the
//! cluster's responsiveness. It never exceeds 3/4 of the scroll timeout,
//! otherwise the sleeping slice's cursor could expire.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Latency-proportional delay between scroll requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throttle {
    factor: f64,
    scroll_timeout: Duration,
}

impl Throttle {
    /// Create a throttle; a factor <= 0 disables it
    pub fn new(factor: f64, scroll_timeout: Duration) -> Self {
        Self {
            factor,
            scroll_timeout,
        }
    }

    /// Whether any delay will ever be applied
    pub fn is_enabled(&self) -> bool {
        self.factor > 0.0
    }

    /// Upper bound of any delay
    pub fn max_delay(&self) -> Duration {
        self.scroll_timeout * 3 / 4
    }

    /// Delay to apply after a request that took `last_request`
    pub fn delay(&self, last_request: Duration) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        // `as u64` saturates, so absurd factors just hit the cap.
        let nanos = (last_request.as_nanos() as f64 * self.factor).round() as u64;
        Duration::from_nanos(nanos).min(self.max_delay())
    }

    /// Sleep for the delay, returning `false` if cancelled first
    pub async fn pause(&self, last_request: Duration, cancel: &CancellationToken) -> bool {
        let delay = self.delay(last_request);
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod throttle_tests {
    use super::*;
    use test_case::test_case;
    use tokio::time::Instant;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test_case(0.0 ; "zero")]
    #[test_case(-1.0 ; "negative")]
    #[test_case(f64::NAN ; "nan")]
    fn test_disabled_throttle_has_no_delay(factor: f64) {
        let throttle = Throttle::new(factor, MINUTE);
        assert!(!throttle.is_enabled());
        assert_eq!(throttle.delay(Duration::from_secs(10)), Duration::ZERO);
    }

    #[test_case(4.0, Duration::from_millis(10), Duration::from_millis(40))]
    #[test_case(0.5, Duration::from_millis(300), Duration::from_millis(150))]
    #[test_case(1.0, Duration::from_secs(2), Duration::from_secs(2))]
    #[test_case(1000.0, Duration::from_secs(1), Duration::from_secs(45) ; "capped")]
    #[test_case(4.0, Duration::from_secs(15), Duration::from_secs(45) ; "exactly at cap")]
    fn test_delay(factor: f64, last: Duration, expected: Duration) {
        let throttle = Throttle::new(factor, MINUTE);
        assert_eq!(throttle.delay(last), expected);
    }

    #[test]
    fn test_delay_is_min_of_scaled_and_cap() {
        let throttle = Throttle::new(3.0, Duration::from_secs(8));
        for ms in [0u64, 1, 500, 1999, 2000, 2001, 10_000] {
            let last = Duration::from_millis(ms);
            let expected = Duration::from_millis(ms * 3).min(Duration::from_secs(6));
            assert_eq!(throttle.delay(last), expected, "last request {ms}ms");
        }
    }

    #[test]
    fn test_huge_factor_saturates_to_cap() {
        let throttle = Throttle::new(f64::MAX, MINUTE);
        assert_eq!(throttle.delay(Duration::from_secs(1)), throttle.max_delay());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_sleeps_for_delay() {
        let throttle = Throttle::new(4.0, MINUTE);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        assert!(throttle.pause(Duration::from_millis(10), &cancel).await);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(40), "slept {elapsed:?}");
        assert!(elapsed < Duration::from_millis(45), "slept {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_interrupted_by_cancellation() {
        let throttle = Throttle::new(1000.0, MINUTE);
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        assert!(!throttle.pause(Duration::from_secs(1), &cancel).await);
        assert!(start.elapsed() < throttle.max_delay());
    }

    #[tokio::test]
    async fn test_pause_when_already_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(!Throttle::new(0.0, MINUTE).pause(Duration::from_secs(1), &cancel).await);
        assert!(!Throttle::new(4.0, MINUTE).pause(Duration::from_secs(1), &cancel).await);
    }
}
