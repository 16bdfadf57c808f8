#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use modkit_cache::{CacheError, Cacher, MemoryCacher};
use modkit_docstore::{MemoryConnector, ObjectId};
use properties::config::PropertiesConfig;
use properties::{NewOwnerParams, NewPropertyParams, PropertiesModule, SaleType};

pub const SERVER: &str = "eu";

/// Memory cache that counts reads and hits.
#[derive(Default)]
pub struct CountingCacher {
    inner: MemoryCacher,
    reads: AtomicUsize,
    hits: AtomicUsize,
}

impl CountingCacher {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Cacher for CountingCacher {
    async fn key_exists(&self, key: &str) -> Result<bool, CacheError> {
        self.inner.key_exists(key).await
    }

    async fn key_get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = self.inner.key_get(key).await?;
        if value.is_some() {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
        Ok(value)
    }

    async fn key_set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        self.inner.key_set(key, value, ttl).await
    }

    async fn key_delete(&self, key: &str) -> Result<bool, CacheError> {
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

pub struct Harness {
    pub connector: Arc<MemoryConnector>,
    pub cache: Arc<CountingCacher>,
    pub module: PropertiesModule,
}

/// A module over fresh in-memory collaborators with [`SERVER`] provisioned.
pub async fn harness() -> Harness {
    let connector = Arc::new(MemoryConnector::new("property_service").with_batch_size(2));
    let cache = Arc::new(CountingCacher::default());
    let module =
        PropertiesModule::new(PropertiesConfig::default(), connector.clone(), cache.clone())
            .unwrap();
    module.provision(SERVER).await.unwrap();
    Harness {
        connector,
        cache,
        module,
    }
}

pub fn owner(name: &str, email: &str) -> NewOwnerParams {
    NewOwnerParams {
        id: None,
        name: name.to_owned(),
        email: email.to_owned(),
        telephone: "555-0100".to_owned(),
    }
}

pub fn property(owner_id: &str, category: &str, title: &str) -> NewPropertyParams {
    NewPropertyParams {
        id: None,
        owner_id: owner_id.to_owned(),
        category: category.to_owned(),
        description: format!("{title}, freshly painted"),
        title: title.to_owned(),
        available: true,
        available_date: Utc::now(),
        address: "12 Harbour St".to_owned(),
        sale_type: SaleType::ForSale,
    }
}

pub fn new_id() -> String {
    ObjectId::new().to_hex()
}
