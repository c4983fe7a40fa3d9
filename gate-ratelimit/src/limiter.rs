//! Rate limiter enforcing a sliding window before every outbound call.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::{QuotaError, QuotaResult};
use crate::policy::RateLimitPolicy;
use crate::store::QuotaStore;

/// Seconds until the oldest entry leaves the window, floored at zero.
#[must_use]
pub const fn wait_seconds(oldest: u64, interval_seconds: u64, now: u64) -> u64 {
    oldest.saturating_add(interval_seconds).saturating_sub(now)
}

/// Sliding-window limiter for one quota key.
///
/// The limiter holds no window state of its own; every check reads and writes
/// the shared [`QuotaStore`].
#[derive(Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter without checking the store.
    #[must_use]
    pub fn new(policy: RateLimitPolicy, store: Arc<dyn QuotaStore>) -> Self {
        Self {
            policy,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    /// Creates a limiter after confirming the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Unreachable`] if the store does not answer a ping.
    pub async fn connect(policy: RateLimitPolicy, store: Arc<dyn QuotaStore>) -> QuotaResult<Self> {
        if let Err(err) = store.ping().await {
            error!(key = %policy.key(), error = %err, "quota store not reachable");
            return Err(QuotaError::Unreachable {
                reason: err.to_string(),
            });
        }
        Ok(Self::new(policy, store))
    }

    /// Creates a limiter, terminating the process if the store is unreachable.
    ///
    /// A capability must never run unmetered, so there is no fallback.
    pub async fn connect_or_exit(policy: RateLimitPolicy, store: Arc<dyn QuotaStore>) -> Self {
        match Self::connect(policy, store).await {
            Ok(limiter) => limiter,
            Err(err) => {
                error!(error = %err, "refusing to run without a quota store");
                std::process::exit(1);
            }
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the enforced policy.
    #[must_use]
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Waits until the window has room, consuming one slot.
    ///
    /// Every evaluation records the caller's entry before the capacity check,
    /// so a caller that has to wait occupies one slot while it waits. Retries
    /// move that entry to the retry time rather than adding a new one.
    /// Concurrent callers may briefly over-admit by up to their number minus
    /// one; each of them then recomputes its wait on the next evaluation.
    ///
    /// There is no cancellation: wrap the future in a timeout if needed.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Store`] if the store fails mid-flight and
    /// [`QuotaError::RetriesExhausted`] if the window stays full for more
    /// evaluations than the policy allows.
    pub async fn acquire(&self) -> QuotaResult<()> {
        let key = self.policy.key();
        let interval = self.policy.interval_seconds();
        let max_requests = u64::from(self.policy.max_requests());
        let attempts = self.policy.max_attempts();

        // One entry per call: every retry moves it instead of adding another.
        let member = format!("{}-{}", self.clock.now_secs(), Uuid::new_v4());

        for attempt in 1..=attempts {
            let now = self.clock.now_secs();
            let count = self.store.admit(key, &member, now, interval).await?;

            if count < max_requests {
                debug!(key = %key, count, attempt, "rate limit slot acquired");
                return Ok(());
            }

            let wait = match self.store.oldest(key).await? {
                Some(oldest) => wait_seconds(oldest, interval, now),
                None => 0,
            };
            if attempt == attempts {
                break;
            }
            warn!(
                key = %key,
                count,
                attempt,
                wait_secs = wait,
                "rate limit exceeded, sleeping"
            );
            tokio::time::sleep(Duration::from_secs(wait)).await;
        }

        Err(QuotaError::RetriesExhausted {
            key: key.to_string(),
            attempts,
        })
    }

    /// Acquires a slot, then drives the outbound call.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by [`RateLimiter::acquire`]; the call is
    /// not started in that case.
    pub async fn metered<F, T>(&self, call: F) -> QuotaResult<T>
    where
        F: Future<Output = T>,
    {
        self.acquire().await?;
        Ok(call.await)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gate_primitives::QuotaKey;
    use tokio::time::Instant;

    use super::*;
    use crate::clock::TokioClock;
    use crate::store::MemoryQuotaStore;

    const ORIGIN: u64 = 1_700_000_000;

    fn limiter(store: Arc<MemoryQuotaStore>, max_requests: u32, interval: u64) -> RateLimiter {
        let policy = RateLimitPolicy::new(QuotaKey::global("finnhub_api").unwrap(), max_requests, interval)
            .unwrap();
        RateLimiter::new(policy, store).with_clock(Arc::new(TokioClock::starting_at(ORIGIN)))
    }

    #[tokio::test(start_paused = true)]
    async fn third_call_in_one_second_waits_for_the_window() {
        let store = Arc::new(MemoryQuotaStore::new());
        let limiter = limiter(Arc::clone(&store), 2, 60);
        let start = Instant::now();

        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn window_never_admits_more_than_max_per_interval() {
        let store = Arc::new(MemoryQuotaStore::new());
        let clock = Arc::new(TokioClock::starting_at(ORIGIN));
        let policy = RateLimitPolicy::new(QuotaKey::global("spotify").unwrap(), 2, 60).unwrap();
        let limiter = RateLimiter::new(policy, store).with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            let clock = Arc::clone(&clock);
            handles.push(tokio::spawn(async move {
                limiter.acquire().await.unwrap();
                clock.now_secs()
            }));
        }

        let mut per_window: BTreeMap<u64, u32> = BTreeMap::new();
        for handle in handles {
            let admitted_at = handle.await.unwrap();
            *per_window.entry((admitted_at - ORIGIN) / 60).or_default() += 1;
        }

        assert_eq!(per_window.values().sum::<u32>(), 5);
        assert!(per_window.values().all(|count| *count <= 2), "{per_window:?}");
    }

    #[tokio::test]
    async fn metered_runs_call_after_acquiring() {
        let store = Arc::new(MemoryQuotaStore::new());
        let limiter = limiter(Arc::clone(&store), 5, 60);

        let value = limiter.metered(async { 42 }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(store.recorded(limiter.policy().key()).unwrap(), 1);
    }

    #[test]
    fn wait_time_is_non_negative_and_shrinks() {
        assert_eq!(wait_seconds(100, 60, 100), 60);
        assert_eq!(wait_seconds(100, 60, 130), 30);
        assert_eq!(wait_seconds(100, 60, 500), 0);

        let waits: Vec<u64> = (100..160).map(|now| wait_seconds(100, 60, now)).collect();
        assert!(waits.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn staggered_caller_is_admitted_when_the_oldest_entry_expires() {
        let store = Arc::new(MemoryQuotaStore::new());
        let limiter = limiter(Arc::clone(&store), 2, 60);
        let start = Instant::now();

        limiter.acquire().await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        limiter.acquire().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        limiter.acquire().await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_secs(60));
        // the entry from t=0 expired and the waiting call kept a single entry
        assert_eq!(store.recorded(limiter.policy().key()).unwrap(), 2);
    }

    /// Memory store that records the wait implied by every `oldest` lookup.
    #[derive(Default)]
    struct RecordingStore {
        inner: MemoryQuotaStore,
        last_admit: Mutex<(u64, u64)>,
        waits: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl QuotaStore for RecordingStore {
        async fn ping(&self) -> QuotaResult<()> {
            self.inner.ping().await
        }

        async fn admit(
            &self,
            key: &QuotaKey,
            member: &str,
            now: u64,
            interval_seconds: u64,
        ) -> QuotaResult<u64> {
            *self.last_admit.lock().unwrap() = (now, interval_seconds);
            self.inner.admit(key, member, now, interval_seconds).await
        }

        async fn oldest(&self, key: &QuotaKey) -> QuotaResult<Option<u64>> {
            let oldest = self.inner.oldest(key).await?;
            let (now, interval) = *self.last_admit.lock().unwrap();
            if let Some(oldest) = oldest {
                self.waits.lock().unwrap().push(wait_seconds(oldest, interval, now));
            }
            Ok(oldest)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_shrink_until_admitted() {
        let store = Arc::new(RecordingStore::default());
        let policy = RateLimitPolicy::new(QuotaKey::global("finnhub_api").unwrap(), 2, 60).unwrap();
        let key = policy.key().clone();
        let limiter = RateLimiter::new(policy, Arc::clone(&store) as Arc<dyn QuotaStore>)
            .with_clock(Arc::new(TokioClock::starting_at(ORIGIN)));

        // three callers from other processes over-admitted at t=0, 10 and 20
        for (offset, member) in [(0, "other-1"), (10, "other-2"), (20, "other-3")] {
            store.admit(&key, member, ORIGIN + offset, 60).await.unwrap();
        }
        let start = Instant::now();
        tokio::time::sleep(Duration::from_secs(30)).await;

        limiter.acquire().await.unwrap();

        let waits = store.waits.lock().unwrap().clone();
        assert_eq!(waits, vec![30, 10]);
        assert!(waits.windows(2).all(|pair| pair[1] < pair[0]));
        assert_eq!(start.elapsed(), Duration::from_secs(70));
    }

    struct DeadStore;

    #[async_trait]
    impl QuotaStore for DeadStore {
        async fn ping(&self) -> QuotaResult<()> {
            Err(QuotaError::store("connection refused"))
        }

        async fn admit(&self, _: &QuotaKey, _: &str, _: u64, _: u64) -> QuotaResult<u64> {
            Err(QuotaError::store("connection reset"))
        }

        async fn oldest(&self, _: &QuotaKey) -> QuotaResult<Option<u64>> {
            Ok(None)
        }
    }

    fn dead_policy() -> RateLimitPolicy {
        RateLimitPolicy::new(QuotaKey::global("weather").unwrap(), 1, 1).unwrap()
    }

    #[tokio::test]
    async fn connect_fails_fast_when_store_is_down() {
        let err = RateLimiter::connect(dead_policy(), Arc::new(DeadStore))
            .await
            .expect_err("unreachable store");
        assert!(matches!(err, QuotaError::Unreachable { .. }));
    }

    #[tokio::test]
    async fn store_failure_during_acquire_propagates() {
        let limiter = RateLimiter::new(dead_policy(), Arc::new(DeadStore));
        let err = limiter.acquire().await.expect_err("store down");
        assert!(matches!(err, QuotaError::Store { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_guard_stops_pathological_waits() {
        let store = Arc::new(MemoryQuotaStore::new());
        let policy = RateLimitPolicy::new(QuotaKey::global("gmail").unwrap(), 1, 60)
            .unwrap()
            .with_max_attempts(1)
            .unwrap();
        let limiter = RateLimiter::new(policy, store).with_clock(Arc::new(TokioClock::starting_at(ORIGIN)));

        limiter.acquire().await.unwrap();
        let err = limiter.acquire().await.expect_err("guard");
        assert!(matches!(err, QuotaError::RetriesExhausted { attempts: 1, .. }));
    }
}
