//! Deduplicating work queue with an explicit in-flight set.

use super::rate_limiter::RateLimiter;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Work queue where a key is held at most once and never processed by two
/// consumers at the same time.
///
/// A key added while it is queued is dropped as a duplicate. A key added
/// while it is in flight is parked and re-queued by [`WorkQueue::done`].
pub struct WorkQueue<K> {
    shared: Arc<Shared<K>>,
}

struct Shared<K> {
    state: Mutex<QueueState<K>>,
    notify: Notify,
    limiter: RateLimiter<K>,
}

struct QueueState<K> {
    queue: VecDeque<K>,
    dirty: HashSet<K>,
    processing: HashSet<K>,
    shutting_down: bool,
}

impl<K> Clone for WorkQueue<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K> std::fmt::Debug for WorkQueue<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue").finish_non_exhaustive()
    }
}

impl<K> Default for WorkQueue<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new(RateLimiter::default())
    }
}

impl<K> WorkQueue<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Creates an empty queue whose delayed re-adds follow `limiter`.
    #[must_use]
    pub fn new(limiter: RateLimiter<K>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    queue: VecDeque::new(),
                    dirty: HashSet::new(),
                    processing: HashSet::new(),
                    shutting_down: false,
                }),
                notify: Notify::new(),
                limiter,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueueState<K>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `key` as needing processing. Never blocks.
    pub fn add(&self, key: K) {
        let mut state = self.state();
        if state.shutting_down || !state.dirty.insert(key.clone()) {
            return;
        }
        if state.processing.contains(&key) {
            return;
        }
        state.queue.push_back(key);
        drop(state);
        self.shared.notify.notify_one();
    }

    /// Adds `key` after `delay`, on a detached timer task.
    pub fn add_after(&self, key: K, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let queue = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.add(key);
        });
    }

    /// Adds `key` after the backoff its failure history calls for.
    pub fn add_rate_limited(&self, key: K) {
        let delay = self.shared.limiter.when(&key);
        self.add_after(key, delay);
    }

    /// Clears the failure history of `key`.
    pub fn forget(&self, key: &K) {
        self.shared.limiter.forget(key);
    }

    /// Returns how many rate-limited re-adds `key` has had.
    #[must_use]
    pub fn num_requeues(&self, key: &K) -> u32 {
        self.shared.limiter.num_requeues(key)
    }

    /// Waits for the next key and marks it in flight.
    ///
    /// Returns `None` once the queue is shut down.
    pub async fn get(&self) -> Option<K> {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.state();
                if state.shutting_down {
                    return None;
                }
                if let Some(key) = state.queue.pop_front() {
                    state.dirty.remove(&key);
                    state.processing.insert(key.clone());
                    let more = !state.queue.is_empty();
                    drop(state);
                    if more {
                        self.shared.notify.notify_one();
                    }
                    return Some(key);
                }
            }
            notified.await;
        }
    }

    /// Ends processing of `key`, re-queueing it if it was added meanwhile.
    pub fn done(&self, key: &K) {
        let mut state = self.state();
        state.processing.remove(key);
        if state.dirty.contains(key) {
            state.queue.push_back(key.clone());
            drop(state);
            self.shared.notify.notify_one();
        }
    }

    /// Stops the queue: pending and future `get` calls return `None`.
    pub fn shut_down(&self) {
        self.state().shutting_down = true;
        self.shared.notify.notify_waiters();
    }

    /// Returns `true` after [`WorkQueue::shut_down`].
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }

    /// Number of keys waiting to be handed out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().queue.len()
    }

    /// Returns `true` when no key is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calls [`WorkQueue::done`] for its key when dropped.
///
/// Workers hold one for every key they take, so the key leaves the
/// in-flight set on every exit path.
pub struct DoneGuard<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    queue: WorkQueue<K>,
    key: K,
}

impl<K> DoneGuard<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    /// Guards `key`, which must have come from `queue.get()`.
    #[must_use]
    pub const fn new(queue: WorkQueue<K>, key: K) -> Self {
        Self { queue, key }
    }

    /// Returns the guarded key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for DoneGuard<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    fn drop(&mut self) {
        self.queue.done(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::{DoneGuard, WorkQueue};
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_adds_before_get_are_delivered_once() {
        let queue = WorkQueue::default();
        queue.add("1/1");
        queue.add("1/1");

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("1/1"));
        assert!(queue.is_empty());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn add_while_in_flight_is_parked_until_done() {
        let queue = WorkQueue::default();
        queue.add("1/1");
        let key = queue.get().await.expect("key");

        queue.add("1/1");
        assert!(queue.is_empty());

        queue.done(&key);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get().await, Some("1/1"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn done_guard_releases_key_on_drop() {
        let queue = WorkQueue::default();
        queue.add("1/1");
        let key = queue.get().await.expect("key");
        {
            let guard = DoneGuard::new(queue.clone(), key);
            assert_eq!(guard.key(), &"1/1");
            queue.add("1/1");
        }

        assert_eq!(queue.get().await, Some("1/1"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn shut_down_wakes_waiting_consumers() {
        let queue: WorkQueue<&'static str> = WorkQueue::default();
        let waiter = {
            let consumer = queue.clone();
            tokio::spawn(async move { consumer.get().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        queue.shut_down();
        queue.add("ignored");

        assert_eq!(waiter.await.expect("join"), None);
        assert!(queue.is_empty());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn waiting_consumer_receives_later_add() {
        let queue = WorkQueue::default();
        let waiter = {
            let consumer = queue.clone();
            tokio::spawn(async move { consumer.get().await })
        };

        queue.add_after("2/3", Duration::from_millis(10));

        let received = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("consumer should wake")
            .expect("join");
        assert_eq!(received, Some("2/3"));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn rate_limited_adds_count_requeues_until_forgotten() {
        let queue = WorkQueue::default();

        queue.add_rate_limited("1/1");
        queue.add_rate_limited("1/1");
        assert_eq!(queue.num_requeues(&"1/1"), 2);

        queue.forget(&"1/1");
        assert_eq!(queue.num_requeues(&"1/1"), 0);
    }
}
