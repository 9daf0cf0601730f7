//! Retry budget and backoff schedule.

use rand::Rng;
use std::time::Duration;

/// Bounded retry with linear backoff plus uniform jitter.
///
/// The delay before attempt `n` (`n >= 2`) is
/// `base_delay * n + uniform(jitter_min, jitter_max)`; with the defaults that
/// is 4 s + 1..3 s before the second attempt and 6 s + 1..3 s before the
/// third.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
    /// Per-request timeout handed to the provider.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            jitter_min: Duration::from_secs(1),
            jitter_max: Duration::from_secs(3),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before `attempt` (1-based). Zero for the first attempt.
    pub fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        self.base_delay * attempt + uniform_between(self.jitter_min, self.jitter_max, rng)
    }
}

/// Uniform duration in `[low, high]`; `high < low` collapses to `low`.
pub fn uniform_between<R: Rng + ?Sized>(low: Duration, high: Duration, rng: &mut R) -> Duration {
    if high <= low {
        return low;
    }
    Duration::from_secs_f64(rng.gen_range(low.as_secs_f64()..=high.as_secs_f64()))
}
