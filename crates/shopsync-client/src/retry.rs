//! Backoff policy for the request layer (spec §4.1): base 350-500ms doubling
//! per attempt, capped at 10s, uniform jitter, up to 8 attempts. Grounded on
//! the teacher's `ExponentialBackoff` wrapper around the `exponential-backoff`
//! crate (journal reader retry policy) — same crate, same shape, different
//! constants.

pub use exponential_backoff::Backoff;
use rand::Rng;
use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 8;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn new() -> Self {
        let base_ms = rand::thread_rng().gen_range(350..500);
        let mut backoff = Backoff::new(
            MAX_ATTEMPTS,
            Duration::from_millis(base_ms),
            Some(Duration::from_secs(10)),
        );
        backoff.set_jitter(0.3);
        backoff.set_factor(2);
        RetryPolicy { backoff }
    }

    /// Delay before the attempt numbered `attempt` (1-based). `None` means
    /// the caller has exhausted its retry budget.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        self.backoff.next(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_increase_and_cap() {
        let policy = RetryPolicy::new();
        let d1 = policy.delay_for_attempt(1).unwrap();
        let d7 = policy.delay_for_attempt(7).unwrap();
        assert!(d1 <= Duration::from_millis(700));
        assert!(d7 <= Duration::from_secs(13)); // capped at 10s + jitter headroom
    }

    #[test]
    fn exhausted_after_max_attempts() {
        let policy = RetryPolicy::new();
        assert!(policy.delay_for_attempt(MAX_ATTEMPTS + 1).is_none());
    }
}
