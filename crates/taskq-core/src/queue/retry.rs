//! Retry policy: decides backoff delays.

use std::time::Duration;

use rand::Rng;

/// Retry policy for failed tasks.
///
/// Exponential backoff capped at `max_delay`, plus jitter of up to half the
/// capped delay so that tasks failing together do not retry together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound for the un-jittered delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay,
        }
    }

    /// Un-jittered delay after `attempts` attempts (1-indexed).
    ///
    /// - attempts 0 or 1: `base_delay`
    /// - attempts n > 1: `min(base_delay * 2^(n-1), max_delay)`
    ///
    /// Example with base=100ms, max=5s:
    /// - attempt 1: 100ms
    /// - attempt 2: 200ms
    /// - attempt 3: 400ms
    /// - attempt 7 and later: 5s
    pub fn backoff(&self, attempts: u32) -> Duration {
        if attempts <= 1 {
            return self.base_delay;
        }

        let exponent = (attempts - 1).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay to wait before re-admitting a task that failed its
    /// `attempts`-th attempt.
    ///
    /// The first retry waits exactly `base_delay`; later ones add a uniform
    /// jitter in `[0, backoff / 2)` drawn from `rng`.
    pub fn next_delay<R: Rng + ?Sized>(&self, attempts: u32, rng: &mut R) -> Duration {
        let delay = self.backoff(attempts);
        if attempts <= 1 {
            return delay;
        }

        let half = u64::try_from((delay / 2).as_nanos()).unwrap_or(u64::MAX);
        if half == 0 {
            return delay;
        }
        delay + Duration::from_nanos(rng.gen_range(0..half))
    }

    /// Longest delay `next_delay` can ever return (for attempts > 1).
    pub fn max_jittered_delay(&self) -> Duration {
        self.max_delay + self.max_delay / 2
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}
