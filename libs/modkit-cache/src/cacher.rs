use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CacheError;

/// A key/value cache with per-entry expiry.
///
/// Plain keys hold a single payload; hash keys hold a field map that expires as a whole.
/// Expired entries read as absent. Every operation fails with [`CacheError::Unavailable`] when
/// the backend cannot be reached.
#[async_trait]
pub trait Cacher: Send + Sync {
    /// # Errors
    /// Backend failures.
    async fn key_exists(&self, key: &str) -> Result<bool, CacheError>;

    /// # Errors
    /// Backend failures.
    async fn key_get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// # Errors
    /// [`CacheError::InvalidTtl`] for a zero `ttl`, or backend failures.
    async fn key_set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether a live entry was removed.
    ///
    /// # Errors
    /// Backend failures.
    async fn key_delete(&self, key: &str) -> Result<bool, CacheError>;

    /// # Errors
    /// Backend failures.
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<Bytes>, CacheError>;

    /// Set `field` of hash `key` and re-arm the expiry of the whole hash.
    ///
    /// # Errors
    /// [`CacheError::InvalidTtl`] for a zero `ttl`, or backend failures.
    async fn hash_set(
        &self,
        key: &str,
        field: &str,
        value: Bytes,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Returns whether a live field was removed.
    ///
    /// # Errors
    /// Backend failures.
    async fn hash_delete(&self, key: &str, field: &str) -> Result<bool, CacheError>;

    /// # Errors
    /// [`CacheError::Unavailable`] when the backend is unhealthy.
    async fn health_check(&self) -> Result<(), CacheError>;
}
