//! Quota store abstraction and the in-process implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gate_primitives::QuotaKey;

use crate::error::{QuotaError, QuotaResult};

/// Shared store holding one ordered set of window entries per quota key.
///
/// Implementations must execute [`QuotaStore::admit`] atomically with respect
/// to every other caller of the same key.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Checks that the store is reachable.
    async fn ping(&self) -> QuotaResult<()>;

    /// Runs the window batch for `key` as one atomic unit:
    ///
    /// 1. removes entries scored at or below `now - interval_seconds`,
    /// 2. removes `member` itself if an earlier attempt recorded it,
    /// 3. counts the surviving entries,
    /// 4. adds `member` scored at `now`,
    /// 5. refreshes the key's time-to-live to `interval_seconds`.
    ///
    /// Returns the count captured in step 3, before the insert. A caller that
    /// retries with the same member therefore never counts against itself.
    async fn admit(
        &self,
        key: &QuotaKey,
        member: &str,
        now: u64,
        interval_seconds: u64,
    ) -> QuotaResult<u64>;

    /// Returns the score of the oldest entry recorded for `key`.
    async fn oldest(&self, key: &QuotaKey) -> QuotaResult<Option<u64>>;
}

#[derive(Debug, Default)]
struct Window {
    entries: Vec<(u64, String)>,
    expires_at: u64,
}

/// Quota store kept in process memory.
///
/// Authoritative only for the process that owns it; limiters in other
/// processes need a shared backend such as Redis.
#[derive(Debug, Default)]
pub struct MemoryQuotaStore {
    windows: Mutex<HashMap<String, Window>>,
}

impl MemoryQuotaStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many entries are currently recorded for `key`, expired or not.
    ///
    /// # Errors
    ///
    /// Returns [`QuotaError::Store`] if the internal lock is poisoned.
    pub fn recorded(&self, key: &QuotaKey) -> QuotaResult<usize> {
        let windows = self.lock()?;
        Ok(windows
            .get(&key.to_string())
            .map_or(0, |window| window.entries.len()))
    }

    fn lock(&self) -> QuotaResult<std::sync::MutexGuard<'_, HashMap<String, Window>>> {
        self.windows
            .lock()
            .map_err(|_| QuotaError::store("memory quota store poisoned"))
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn ping(&self) -> QuotaResult<()> {
        self.lock().map(|_| ())
    }

    async fn admit(
        &self,
        key: &QuotaKey,
        member: &str,
        now: u64,
        interval_seconds: u64,
    ) -> QuotaResult<u64> {
        let mut windows = self.lock()?;
        let window = windows.entry(key.to_string()).or_default();

        if window.expires_at <= now {
            window.entries.clear();
        }

        let cutoff = now.checked_sub(interval_seconds);
        window.entries.retain(|(score, recorded)| {
            cutoff.is_none_or(|cutoff| *score > cutoff) && recorded != member
        });

        let count = window.entries.len() as u64;
        window.entries.push((now, member.to_owned()));
        window.expires_at = now + interval_seconds;

        Ok(count)
    }

    async fn oldest(&self, key: &QuotaKey) -> QuotaResult<Option<u64>> {
        let windows = self.lock()?;
        Ok(windows
            .get(&key.to_string())
            .and_then(|window| window.entries.iter().map(|(score, _)| *score).min()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> QuotaKey {
        QuotaKey::global("weather").expect("key")
    }

    #[tokio::test]
    async fn admit_returns_count_before_insert() {
        let store = MemoryQuotaStore::new();
        assert_eq!(store.admit(&key(), "a", 100, 60).await.unwrap(), 0);
        assert_eq!(store.admit(&key(), "b", 100, 60).await.unwrap(), 1);
        assert_eq!(store.admit(&key(), "c", 101, 60).await.unwrap(), 2);
        assert_eq!(store.recorded(&key()).unwrap(), 3);
        assert_eq!(store.oldest(&key()).await.unwrap(), Some(100));
    }

    #[tokio::test]
    async fn entries_expire_after_interval() {
        let store = MemoryQuotaStore::new();
        store.admit(&key(), "a", 100, 60).await.unwrap();
        store.admit(&key(), "b", 130, 60).await.unwrap();

        // at 160 the entry scored 100 is exactly one interval old
        assert_eq!(store.admit(&key(), "c", 160, 60).await.unwrap(), 1);
        assert_eq!(store.oldest(&key()).await.unwrap(), Some(130));
    }

    #[tokio::test]
    async fn readmitting_a_member_replaces_its_entry() {
        let store = MemoryQuotaStore::new();
        store.admit(&key(), "a", 100, 60).await.unwrap();
        store.admit(&key(), "b", 110, 60).await.unwrap();

        assert_eq!(store.admit(&key(), "b", 130, 60).await.unwrap(), 1);
        assert_eq!(store.recorded(&key()).unwrap(), 2);

        // only "a" expired at 160; "b" was moved to 130
        assert_eq!(store.admit(&key(), "b", 160, 60).await.unwrap(), 0);
        assert_eq!(store.oldest(&key()).await.unwrap(), Some(160));
    }

    #[tokio::test]
    async fn idle_key_expires_entirely() {
        let store = MemoryQuotaStore::new();
        store.admit(&key(), "a", 100, 60).await.unwrap();
        store.admit(&key(), "b", 100, 60).await.unwrap();

        assert_eq!(store.admit(&key(), "c", 500, 60).await.unwrap(), 0);
        assert_eq!(store.recorded(&key()).unwrap(), 1);
    }

    #[tokio::test]
    async fn keys_do_not_share_windows() {
        let store = MemoryQuotaStore::new();
        let other = QuotaKey::new("weather", "bob").expect("key");
        store.admit(&key(), "a", 100, 60).await.unwrap();
        assert_eq!(store.admit(&other, "b", 100, 60).await.unwrap(), 0);
        assert_eq!(store.oldest(&QuotaKey::global("spotify").unwrap()).await.unwrap(), None);
    }
}
