//! Retry delay policy for the work queue.
//!
//! The delay for a key is the larger of a per-key exponential backoff and
//! the wait imposed by a process-wide token bucket.

use governor::{
    Quota, RateLimiter as Bucket,
    clock::{Clock as _, DefaultClock as BucketClock},
    state::{InMemoryState, NotKeyed},
};
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroU32;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Backoff of the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(5);
/// Backoff ceiling for a single key.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1000);

const DEFAULT_BUCKET_RATE: u32 = 10;
const DEFAULT_BUCKET_BURST: u32 = 100;

/// Combined per-key exponential and overall token-bucket limiter.
pub struct RateLimiter<K> {
    base: Duration,
    max: Duration,
    failures: Mutex<HashMap<K, u32>>,
    bucket: Bucket<NotKeyed, InMemoryState, BucketClock>,
    clock: BucketClock,
}

impl<K> std::fmt::Debug for RateLimiter<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("base", &self.base)
            .field("max", &self.max)
            .finish_non_exhaustive()
    }
}

impl<K: Eq + Hash + Clone> Default for RateLimiter<K> {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    /// Creates a limiter whose per-key backoff grows from `base` to `max`.
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        let rate = NonZeroU32::new(DEFAULT_BUCKET_RATE).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(DEFAULT_BUCKET_BURST).unwrap_or(NonZeroU32::MIN);
        Self {
            base,
            max,
            failures: Mutex::new(HashMap::new()),
            bucket: Bucket::direct(Quota::per_second(rate).allow_burst(burst)),
            clock: BucketClock::default(),
        }
    }

    /// Records one more failure for `key` and returns how long to wait.
    pub fn when(&self, key: &K) -> Duration {
        let exponent = {
            let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            let count = failures.entry(key.clone()).or_insert(0);
            let exponent = *count;
            *count = count.saturating_add(1);
            exponent
        };
        let per_key = 2_u32
            .checked_pow(exponent)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max));
        let overall = self
            .bucket
            .check()
            .map_or_else(
                |not_until| not_until.wait_time_from(self.clock.now()),
                |()| Duration::ZERO,
            );
        per_key.max(overall)
    }

    /// Returns how many failures are on record for `key`.
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(0)
    }

    /// Clears the failure history of `key`.
    pub fn forget(&self, key: &K) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::RateLimiter;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    fn backoff_doubles_per_failure_and_is_capped() {
        let limiter = RateLimiter::new(Duration::from_millis(10), Duration::from_millis(50));

        let delays: Vec<_> = (0..5).map(|_| limiter.when(&"key")).collect();

        assert_eq!(
            delays,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40),
                Duration::from_millis(50),
                Duration::from_millis(50),
            ]
        );
        assert_eq!(limiter.num_requeues(&"key"), 5);
    }

    #[rstest]
    fn forget_resets_backoff() {
        let limiter = RateLimiter::new(Duration::from_millis(10), Duration::from_secs(1));
        limiter.when(&"key");
        limiter.when(&"key");

        limiter.forget(&"key");

        assert_eq!(limiter.num_requeues(&"key"), 0);
        assert_eq!(limiter.when(&"key"), Duration::from_millis(10));
    }

    #[rstest]
    fn keys_back_off_independently() {
        let limiter = RateLimiter::new(Duration::from_millis(10), Duration::from_secs(1));
        limiter.when(&"a");
        limiter.when(&"a");

        assert_eq!(limiter.when(&"b"), Duration::from_millis(10));
    }
}
