//! In-memory [`Cacher`] with a single expiry scheduler.
//!
//! Both maps live behind one lock. Every write pushes a deadline onto a min-heap and wakes the
//! scheduler task, which sleeps until the earliest deadline and purges whatever has expired.
//! Deadlines carry the generation of the write that armed them, so a stale deadline never
//! removes a newer entry. Reads compare against the clock as well, so an entry is never
//! observed past its expiry even if the scheduler has not run yet.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::cacher::Cacher;
use crate::error::CacheError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Key,
    Hash,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Deadline {
    at: Instant,
    generation: u64,
    slot: Slot,
    key: String,
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
    generation: u64,
}

impl<V> Entry<V> {
    fn live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
struct State {
    keys: HashMap<String, Entry<Bytes>>,
    hashes: HashMap<String, Entry<HashMap<String, Bytes>>>,
    deadlines: BinaryHeap<Reverse<Deadline>>,
    generation: u64,
}

impl State {
    fn arm(&mut self, slot: Slot, key: &str, at: Instant) -> u64 {
        self.generation += 1;
        self.deadlines.push(Reverse(Deadline {
            at,
            generation: self.generation,
            slot,
            key: key.to_owned(),
        }));
        self.generation
    }

    /// Remove everything due at `now`; returns how many entries went and the next deadline.
    fn purge(&mut self, now: Instant) -> (usize, Option<Instant>) {
        let mut purged = 0;
        while let Some(Reverse(next)) = self.deadlines.peek() {
            if next.at > now {
                return (purged, Some(next.at));
            }
            let Some(Reverse(due)) = self.deadlines.pop() else {
                break;
            };
            let removed = match due.slot {
                Slot::Key => remove_generation(&mut self.keys, &due),
                Slot::Hash => remove_generation(&mut self.hashes, &due),
            };
            purged += usize::from(removed);
        }
        (purged, None)
    }
}

fn remove_generation<V>(map: &mut HashMap<String, Entry<V>>, due: &Deadline) -> bool {
    if map
        .get(&due.key)
        .is_some_and(|entry| entry.generation == due.generation)
    {
        map.remove(&due.key);
        true
    } else {
        false
    }
}

struct Inner {
    state: RwLock<State>,
    wake: Notify,
    available: AtomicBool,
}

impl Inner {
    fn check(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("memory cache disabled".to_owned()))
        }
    }
}

async fn run_expiry(inner: Arc<Inner>, cancel: CancellationToken) {
    loop {
        let (purged, next) = inner.state.write().purge(Instant::now());
        if purged > 0 {
            trace!(purged, "expired cache entries");
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("cache expiry scheduler stopped");
                break;
            }
            () = inner.wake.notified() => {}
            () = sleep_or_park(next) => {}
        }
    }
}

async fn sleep_or_park(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Process-local cache. Must be created inside a tokio runtime; dropping it stops the
/// expiry scheduler.
pub struct MemoryCacher {
    inner: Arc<Inner>,
    cancel: CancellationToken,
}

impl MemoryCacher {
    #[must_use]
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            state: RwLock::new(State::default()),
            wake: Notify::new(),
            available: AtomicBool::new(true),
        });
        let cancel = CancellationToken::new();
        tokio::spawn(run_expiry(Arc::clone(&inner), cancel.clone()));
        Self { inner, cancel }
    }

    /// Simulate a backend outage: while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    /// Stored entries, including expired ones the scheduler has not purged yet.
    #[must_use]
    pub fn stored_len(&self) -> usize {
        let state = self.inner.state.read();
        state.keys.len() + state.hashes.len()
    }

    fn expiry(ttl: Duration) -> Result<Instant, CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl);
        }
        Ok(Instant::now() + ttl)
    }
}

impl Default for MemoryCacher {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryCacher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl Cacher for MemoryCacher {
    async fn key_exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.check()?;
        let now = Instant::now();
        Ok(self
            .inner
            .state
            .read()
            .keys
            .get(key)
            .is_some_and(|e| e.live(now)))
    }

    async fn key_get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.inner.check()?;
        let now = Instant::now();
        Ok(self
            .inner
            .state
            .read()
            .keys
            .get(key)
            .filter(|e| e.live(now))
            .map(|e| e.value.clone()))
    }

    async fn key_set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.inner.check()?;
        let expires_at = Self::expiry(ttl)?;
        {
            let mut state = self.inner.state.write();
            let generation = state.arm(Slot::Key, key, expires_at);
            state.keys.insert(
                key.to_owned(),
                Entry {
                    value,
                    expires_at,
                    generation,
                },
            );
        }
        self.inner.wake.notify_one();
        Ok(())
    }

    async fn key_delete(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.check()?;
        let now = Instant::now();
        let removed = self.inner.state.write().keys.remove(key);
        Ok(removed.is_some_and(|e| e.live(now)))
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Bytes>, CacheError> {
        self.inner.check()?;
        let now = Instant::now();
        Ok(self
            .inner
            .state
            .read()
            .hashes
            .get(key)
            .filter(|e| e.live(now))
            .and_then(|e| e.value.get(field).cloned()))
    }

    async fn hash_set(
        &self,
        key: &str,
        field: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.inner.check()?;
        let expires_at = Self::expiry(ttl)?;
        let now = Instant::now();
        {
            let mut state = self.inner.state.write();
            let generation = state.arm(Slot::Hash, key, expires_at);
            let entry = state
                .hashes
                .entry(key.to_owned())
                .or_insert_with(|| Entry {
                    value: HashMap::new(),
                    expires_at,
                    generation,
                });
            if !entry.live(now) {
                entry.value.clear();
            }
            entry.value.insert(field.to_owned(), value);
            entry.expires_at = expires_at;
            entry.generation = generation;
        }
        self.inner.wake.notify_one();
        Ok(())
    }

    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, CacheError> {
        self.inner.check()?;
        let now = Instant::now();
        let mut state = self.inner.state.write();
        let Some(entry) = state.hashes.get_mut(key) else {
            return Ok(false);
        };
        if !entry.live(now) {
            return Ok(false);
        }
        let removed = entry.value.remove(field).is_some();
        if entry.value.is_empty() {
            state.hashes.remove(key);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        self.inner.check()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    async fn settle() {
        // Lets the scheduler observe the advanced clock.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn keys_expire_after_their_ttl() {
        let cache = MemoryCacher::new();
        cache.key_set("k", Bytes::from_static(b"v"), TTL).await.unwrap();
        assert_eq!(cache.key_get("k").await.unwrap(), Some(Bytes::from_static(b"v")));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.key_exists("k").await.unwrap());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!cache.key_exists("k").await.unwrap());
        assert_eq!(cache.key_get("k").await.unwrap(), None);

        settle().await;
        assert_eq!(cache.stored_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rewriting_a_key_rearms_its_expiry() {
        let cache = MemoryCacher::new();
        cache.key_set("k", Bytes::from_static(b"1"), TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.key_set("k", Bytes::from_static(b"2"), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(cache.key_get("k").await.unwrap(), Some(Bytes::from_static(b"2")));

        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(cache.key_get("k").await.unwrap(), None);
        assert_eq!(cache.stored_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hashes_expire_as_a_whole() {
        let cache = MemoryCacher::new();
        cache.hash_set("h", "a", Bytes::from_static(b"1"), TTL).await.unwrap();
        cache.hash_set("h", "b", Bytes::from_static(b"2"), TTL).await.unwrap();
        assert_eq!(cache.hash_get("h", "b").await.unwrap(), Some(Bytes::from_static(b"2")));
        assert!(cache.hash_delete("h", "a").await.unwrap());
        assert!(!cache.hash_delete("h", "a").await.unwrap());

        tokio::time::advance(TTL).await;
        assert_eq!(cache.hash_get("h", "b").await.unwrap(), None);
        settle().await;
        assert_eq!(cache.stored_len(), 0);
    }

    #[tokio::test]
    async fn delete_reports_live_entries_only() {
        let cache = MemoryCacher::new();
        assert!(!cache.key_delete("missing").await.unwrap());
        cache.key_set("k", Bytes::from_static(b"v"), TTL).await.unwrap();
        assert!(cache.key_delete("k").await.unwrap());
        assert!(!cache.key_exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let cache = MemoryCacher::new();
        let err = cache
            .key_set("k", Bytes::new(), Duration::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::InvalidTtl);
    }

    #[tokio::test]
    async fn unavailable_cache_fails_every_call() {
        let cache = MemoryCacher::new();
        cache.set_available(false);
        assert!(matches!(cache.health_check().await, Err(CacheError::Unavailable(_))));
        assert!(cache.key_get("k").await.is_err());
        cache.set_available(true);
        assert!(cache.health_check().await.is_ok());
    }
}
