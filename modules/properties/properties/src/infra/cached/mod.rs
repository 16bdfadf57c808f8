//! Read-through, write-invalidate caching around the repository facades.
//!
//! Cache failures never fail a call: a read error counts as a miss and a write error is logged
//! and dropped. Payloads are the JSON form of the domain records.
//!
//! Each record also has a version stamp under `ver:<server>:<id>`, replaced on every mutation.
//! A point read that misses only repopulates when the stamp is unchanged after the store read,
//! so a read racing a mutation does not put the old record back for a full TTL.

mod owner;
mod property;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use modkit_cache::Cacher;
use modkit_errors::AppResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

pub use owner::CachedOwnerRepository;
pub use property::CachedPropertyRepository;

/// Stamp used while no generation or version entry is live.
const INITIAL_GENERATION: &str = "0";

fn point_key(server: &str, id: &str) -> String {
    format!("get:{server}:{id}")
}

fn version_key(server: &str, id: &str) -> String {
    format!("ver:{server}:{id}")
}

fn generation_key(server: &str) -> String {
    format!("list-gen:{server}")
}

/// Cache access shared by the decorators.
#[derive(Clone)]
struct CacheLayer {
    cache: Arc<dyn Cacher>,
    ttl: Duration,
}

impl CacheLayer {
    fn new(cache: Arc<dyn Cacher>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.cache.key_get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "cache miss");
                return None;
            }
            Err(err) => {
                warn!(key, error = %err, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(key, error = %err, "discarding corrupt cache entry");
                None
            }
        }
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_vec(value) {
            Ok(payload) => Bytes::from(payload),
            Err(err) => {
                warn!(key, error = %err, "failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.cache.key_set(key, payload, self.ttl).await {
            warn!(key, error = %err, "cache write failed");
        }
    }

    async fn forget(&self, key: &str) {
        if let Err(err) = self.cache.key_delete(key).await {
            warn!(key, error = %err, "cache invalidation failed");
        }
    }

    async fn stamp(&self, key: &str) -> String {
        match self.cache.key_get(key).await {
            Ok(Some(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(None) => INITIAL_GENERATION.to_owned(),
            Err(err) => {
                warn!(key, error = %err, "cache read failed");
                INITIAL_GENERATION.to_owned()
            }
        }
    }

    async fn restamp(&self, key: &str) {
        let next = Bytes::from(Uuid::new_v4().to_string());
        if let Err(err) = self.cache.key_set(key, next, self.ttl).await {
            warn!(key, error = %err, "failed to replace cache stamp");
        }
    }

    /// Current list generation of `server`.
    async fn generation(&self, server: &str) -> String {
        self.stamp(&generation_key(server)).await
    }

    /// Make every list entry of `server` unreachable.
    async fn bump_generation(&self, server: &str) {
        self.restamp(&generation_key(server)).await;
    }

    /// Serve record `id` from the cache, or `load` it and cache the result unless the record
    /// was mutated while loading.
    async fn read_through<T, F>(&self, server: &str, id: &str, load: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        F: Future<Output = AppResult<T>> + Send,
    {
        let key = point_key(server, id);
        if let Some(value) = self.read(&key).await {
            return Ok(value);
        }
        let version = version_key(server, id);
        let before = self.stamp(&version).await;
        let value = load.await?;
        if self.stamp(&version).await == before {
            self.write(&key, &value).await;
        } else {
            debug!(key, "record changed during read; not caching");
        }
        Ok(value)
    }

    /// Drop the cached copy of record `id` after a mutation.
    async fn invalidate(&self, server: &str, id: &str) {
        self.restamp(&version_key(server, id)).await;
        self.forget(&point_key(server, id)).await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Cacher double that counts calls and can be switched off.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use modkit_cache::{CacheError, MemoryCacher};

    use super::{Bytes, Cacher, Duration};

    #[derive(Default)]
    pub struct CountingCacher {
        inner: MemoryCacher,
        pub gets: AtomicUsize,
        pub hits: AtomicUsize,
        pub sets: AtomicUsize,
        pub deletes: AtomicUsize,
    }

    impl CountingCacher {
        pub fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }

        pub fn set_available(&self, available: bool) {
            self.inner.set_available(available);
        }

        pub async fn raw_set(&self, key: &str, value: &[u8]) {
            self.inner
                .key_set(key, Bytes::copy_from_slice(value), Duration::from_secs(60))
                .await
                .unwrap();
        }
    }

    #[async_trait]
    impl Cacher for CountingCacher {
        async fn key_exists(&self, key: &str) -> Result<bool, CacheError> {
            self.inner.key_exists(key).await
        }

        async fn key_get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            let value = self.inner.key_get(key).await?;
            if value.is_some() {
                self.hits.fetch_add(1, Ordering::SeqCst);
            }
            Ok(value)
        }

        async fn key_set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            self.inner.key_set(key, value, ttl).await
        }

        async fn key_delete(&self, key: &str) -> Result<bool, CacheError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.key_delete(key).await
        }

        async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Bytes>, CacheError> {
            self.inner.hash_get(key, field).await
        }

        async fn hash_set(
            &self,
            key: &str,
            field: &str,
            value: Bytes,
            ttl: Duration,
        ) -> Result<(), CacheError> {
            self.inner.hash_set(key, field, value, ttl).await
        }

        async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, CacheError> {
            self.inner.hash_delete(key, field).await
        }

        async fn health_check(&self) -> Result<(), CacheError> {
            self.inner.health_check().await
        }
    }
}
