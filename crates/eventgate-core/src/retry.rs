//! Exponential backoff retry policy shared by the Durable Queue and the
//! Webhook Fan-out Engine (spec §4.2, §4.4).
//!
//! Jittered exponential backoff prevents synchronized retry storms across
//! many events retrying against the same subscriber at once.

use rand::Rng;
use std::time::Duration;

/// Retry policy configuration for exponential backoff.
///
/// The Fan-out Engine's delivery policy (§4.4) is `RetryPolicy::fan_out()`:
/// 4 total attempts, {2s, 4s, 8s} backoff before attempts 2, 3, 4.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial attempt).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Delay cap.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub use_jitter: bool,
    /// Jitter range as a fraction of the computed delay (default 0.25 = ±25%).
    pub jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_fraction: 0.25,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            backoff_multiplier,
            use_jitter: true,
            jitter_fraction: 0.25,
        }
    }

    /// The Fan-out Engine's delivery policy (§4.4): up to 4 total attempts
    /// (initial + 3 retries), backoff {2s, 4s, 8s}, no jitter so the
    /// documented boundary delays in §8 hold exactly.
    pub fn fan_out() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(8),
            backoff_multiplier: 2.0,
            use_jitter: false,
            jitter_fraction: 0.0,
        }
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Calculate the delay before a given retry attempt (0-based: attempt 0
    /// is the first retry, following the initial attempt).
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        let capped_delay_secs = base_delay_secs.min(self.max_delay.as_secs_f64());

        let final_delay_secs = if self.use_jitter {
            Self::add_jitter(capped_delay_secs, self.jitter_fraction)
        } else {
            capped_delay_secs
        };

        Duration::from_secs_f64(final_delay_secs)
    }

    /// Whether another retry attempt is permitted for the given attempt number.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Total attempts including the initial one.
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts + 1
    }

    fn add_jitter(delay_secs: f64, jitter_fraction: f64) -> f64 {
        let mut rng = rand::rng();
        let jitter_range = delay_secs * jitter_fraction;
        let jitter = rng.random_range(-jitter_range..=jitter_range);
        (delay_secs + jitter).max(0.0)
    }
}

/// Mutable cursor over a [`RetryPolicy`], tracking how many attempts have
/// been made so far.
#[derive(Debug, Clone)]
pub struct RetryState {
    /// Current retry attempt (0-based).
    pub attempt: u32,
    /// Total attempts made so far, including the initial attempt.
    pub total_attempts: u32,
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryState {
    pub fn new() -> Self {
        Self {
            attempt: 0,
            total_attempts: 1,
        }
    }

    pub fn next_attempt(&mut self) {
        self.attempt += 1;
        self.total_attempts += 1;
    }

    pub fn get_delay(&self, policy: &RetryPolicy) -> Duration {
        policy.calculate_delay(self.attempt)
    }

    pub fn can_retry(&self, policy: &RetryPolicy) -> bool {
        policy.should_retry(self.attempt)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
