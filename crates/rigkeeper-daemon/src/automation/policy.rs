use crate::config::RestartConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Consecutive below-threshold readings needed before acting.
pub const LOW_HASHRATE_READINGS: u32 = 2;

/// `min(base * 2^attempt, max)`, saturating.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartDecision {
    Restart { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
}

/// Bounded exponential backoff for crash recovery.
#[derive(Clone, Debug)]
pub struct RestartPolicy {
    config: RestartConfig,
    attempt_count: u32,
    last_restart_at: Option<Instant>,
}

impl RestartPolicy {
    pub fn new(config: RestartConfig) -> Self {
        Self {
            config,
            attempt_count: 0,
            last_restart_at: None,
        }
    }

    pub fn config(&self) -> RestartConfig {
        self.config
    }

    /// Swap limits on reload without forgetting attempts already made.
    pub fn set_config(&mut self, config: RestartConfig) {
        self.config = config;
    }

    pub fn attempts(&self) -> u32 {
        self.attempt_count
    }

    pub fn last_restart_at(&self) -> Option<Instant> {
        self.last_restart_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.config.max_attempts
    }

    /// Clears the counter once the reset window has passed since the last restart.
    pub fn apply_reset_window(&mut self, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.reset_window_secs);
        match self.last_restart_at {
            Some(last) if self.attempt_count > 0 && now.saturating_duration_since(last) > window => {
                self.attempt_count = 0;
                true
            }
            _ => false,
        }
    }

    pub fn decide(&mut self, now: Instant) -> RestartDecision {
        self.apply_reset_window(now);

        if self.is_exhausted() {
            return RestartDecision::Exhausted {
                attempts: self.attempt_count,
            };
        }

        RestartDecision::Restart {
            attempt: self.attempt_count + 1,
            delay: backoff_delay(
                self.attempt_count,
                Duration::from_secs(self.config.base_delay_secs),
                Duration::from_secs(self.config.max_delay_secs),
            ),
        }
    }

    pub fn record_restart(&mut self, at: Instant) {
        self.attempt_count += 1;
        self.last_restart_at = Some(at);
    }

    pub fn reset(&mut self) {
        self.attempt_count = 0;
        self.last_restart_at = None;
    }
}

/// Debounce for low hashrate: fires on the second consecutive low reading.
#[derive(Clone, Debug, Default)]
pub struct LowThroughputTracker {
    consecutive: u32,
}

impl LowThroughputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the caller should alert and restart. The counter resets when it fires.
    pub fn observe(&mut self, hashrate: f64, threshold: f64) -> bool {
        if hashrate >= threshold {
            self.consecutive = 0;
            return false;
        }

        self.consecutive += 1;
        if self.consecutive >= LOW_HASHRATE_READINGS {
            self.consecutive = 0;
            return true;
        }
        false
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE: Duration = Duration::from_secs(60);
    const MAX: Duration = Duration::from_secs(600);

    #[test]
    fn test_backoff_sequence_caps_at_attempt_four() {
        let delays: Vec<u64> = (0..7).map(|n| backoff_delay(n, BASE, MAX).as_secs()).collect();
        assert_eq!(delays, vec![60, 120, 240, 480, 600, 600, 600]);
    }

    #[test]
    fn test_backoff_huge_attempt_saturates() {
        assert_eq!(backoff_delay(64, BASE, MAX), MAX);
        assert_eq!(backoff_delay(u32::MAX, BASE, MAX), MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_policy_exhausts_after_max_attempts() {
        let mut policy = RestartPolicy::new(RestartConfig::default());

        for expected in [60, 120, 240, 480, 600] {
            match policy.decide(Instant::now()) {
                RestartDecision::Restart { delay, .. } => assert_eq!(delay.as_secs(), expected),
                other => panic!("unexpected decision {:?}", other),
            }
            tokio::time::advance(Duration::from_secs(expected)).await;
            policy.record_restart(Instant::now());
        }

        assert_eq!(policy.decide(Instant::now()), RestartDecision::Exhausted { attempts: 5 });
        assert!(policy.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_window_clears_attempts() {
        let mut policy = RestartPolicy::new(RestartConfig::default());
        policy.record_restart(Instant::now());
        policy.record_restart(Instant::now());
        assert_eq!(policy.attempts(), 2);

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(!policy.apply_reset_window(Instant::now()), "window is exclusive");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(
            policy.decide(Instant::now()),
            RestartDecision::Restart {
                attempt: 1,
                delay: Duration::from_secs(60)
            }
        );
        assert_eq!(policy.attempts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_lifts_after_reset_window() {
        let mut policy = RestartPolicy::new(RestartConfig {
            max_attempts: 1,
            ..RestartConfig::default()
        });
        policy.record_restart(Instant::now());
        assert!(matches!(policy.decide(Instant::now()), RestartDecision::Exhausted { .. }));

        tokio::time::advance(Duration::from_secs(301)).await;
        assert!(matches!(policy.decide(Instant::now()), RestartDecision::Restart { attempt: 1, .. }));
    }

    #[test]
    fn test_low_throughput_debounce() {
        let mut tracker = LowThroughputTracker::new();
        let fired: Vec<bool> = [15.0, 25.0, 15.0].iter().map(|&h| tracker.observe(h, 20.0)).collect();
        assert_eq!(fired, vec![false, false, false]);
        assert_eq!(tracker.consecutive(), 1);

        let mut tracker = LowThroughputTracker::new();
        assert!(!tracker.observe(15.0, 20.0));
        assert!(tracker.observe(15.0, 20.0));
        assert_eq!(tracker.consecutive(), 0);
        assert!(!tracker.observe(15.0, 20.0));
    }

    #[test]
    fn test_threshold_reading_is_healthy() {
        let mut tracker = LowThroughputTracker::new();
        assert!(!tracker.observe(19.9, 20.0));
        assert!(!tracker.observe(20.0, 20.0));
        assert_eq!(tracker.consecutive(), 0);
    }

    proptest! {
        #[test]
        fn prop_backoff_is_monotonic_and_capped(base in 1u64..3600, extra in 0u64..36000, attempt in 0u32..40) {
            let base = Duration::from_secs(base);
            let max = base + Duration::from_secs(extra);
            let delay = backoff_delay(attempt, base, max);
            prop_assert!(delay >= base.min(max));
            prop_assert!(delay <= max);
            prop_assert!(backoff_delay(attempt + 1, base, max) >= delay);
        }

        #[test]
        fn prop_tracker_never_fires_on_isolated_lows(readings in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut tracker = LowThroughputTracker::new();
            let mut previous_low = false;
            for low in readings {
                let fired = tracker.observe(if low { 10.0 } else { 30.0 }, 20.0);
                if fired {
                    prop_assert!(low && previous_low);
                    previous_low = false;
                } else {
                    previous_low = low;
                }
            }
        }
    }
}
