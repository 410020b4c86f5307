//! Reconnect backoff policy.
//!
//! Exponential delay with multiplicative jitter and a capped attempt count.
//! Stateless: the caller tracks the attempt number.

use std::time::Duration;

use rand::Rng;

use confab_types::config::ReconnectConfig;

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
}

impl ReconnectPolicy {
    pub fn new(config: ReconnectConfig) -> Self {
        Self { config }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Un-jittered delay before attempt `attempt` (1-based).
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let initial = self.config.initial_delay_ms as f64;
        let multiplier = self.config.multiplier.max(1.0);
        let scaled = initial * multiplier.powi(exponent);
        let capped = scaled.min(self.config.max_delay_ms as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay before attempt `attempt` (1-based), or `None` if the policy is
    /// disabled or the attempt budget is spent.
    pub fn delay_for(&self, attempt: u32, rng: &mut impl Rng) -> Option<Duration> {
        if !self.config.enabled || attempt == 0 || attempt > self.config.max_attempts {
            return None;
        }
        let base = self.base_delay(attempt);
        let jitter = self.config.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return Some(base);
        }
        let factor = 1.0 + rng.gen_range(-jitter..=jitter);
        Some(Duration::from_millis((base.as_millis() as f64 * factor).round() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn policy(jitter: f64) -> ReconnectPolicy {
        ReconnectPolicy::new(ReconnectConfig {
            enabled: true,
            max_attempts: 5,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            jitter,
        })
    }

    #[test]
    fn test_base_delay_grows_and_caps() {
        let p = policy(0.0);
        assert_eq!(p.base_delay(1), Duration::from_millis(1_000));
        assert_eq!(p.base_delay(2), Duration::from_millis(2_000));
        assert_eq!(p.base_delay(3), Duration::from_millis(4_000));
        assert_eq!(p.base_delay(4), Duration::from_millis(8_000));
        assert_eq!(p.base_delay(5), Duration::from_millis(10_000));
        assert_eq!(p.base_delay(40), Duration::from_millis(10_000));
    }

    #[test]
    fn test_attempt_budget() {
        let p = policy(0.0);
        let mut rng = StdRng::seed_from_u64(7);
        assert!(p.delay_for(0, &mut rng).is_none());
        for attempt in 1..=5 {
            assert!(p.delay_for(attempt, &mut rng).is_some());
        }
        assert!(p.delay_for(6, &mut rng).is_none());
    }

    #[test]
    fn test_disabled_never_retries() {
        let p = ReconnectPolicy::new(ReconnectConfig::disabled());
        let mut rng = StdRng::seed_from_u64(7);
        assert!(!p.enabled());
        assert!(p.delay_for(1, &mut rng).is_none());
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let p = policy(0.2);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let delay = p.delay_for(2, &mut rng).unwrap().as_millis();
            assert!((1_600..=2_400).contains(&delay), "delay {delay}ms out of range");
        }
    }

    #[test]
    fn test_without_jitter_is_deterministic() {
        let p = policy(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(p.delay_for(3, &mut rng), Some(Duration::from_millis(4_000)));
    }
}
