//! In-memory reference store.
//!
//! Collections live behind a read-mostly map; each collection guards its documents and
//! indexes with a single lock. [`MemoryConnector::set_online`] simulates a driver outage:
//! every subsequent call, including pulls from open cursors, fails with
//! [`StoreError::Unavailable`].

mod aggregate;
mod collection;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{Collection, Connector};
use crate::stream::BATCH_SIZE;

pub use collection::{MemoryCollection, MemoryCursor};

pub struct MemoryConnector {
    database: String,
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
    online: Arc<AtomicBool>,
    batch_size: usize,
}

impl MemoryConnector {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: RwLock::new(HashMap::new()),
            online: Arc::new(AtomicBool::new(true)),
            batch_size: BATCH_SIZE,
        }
    }

    /// Default cursor batch size for collections created afterwards.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "database '{}' is offline",
                self.database
            )))
        }
    }

    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    fn database_name(&self) -> &str {
        &self.database
    }

    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>, StoreError> {
        self.collections
            .read()
            .get(name)
            .map(|c| Arc::clone(c) as Arc<dyn Collection>)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_owned()))
    }

    async fn create_collection(&self, name: &str) -> Result<Arc<dyn Collection>, StoreError> {
        self.check_online()?;
        let mut collections = self.collections.write();
        let collection = collections.entry(name.to_owned()).or_insert_with(|| {
            debug!(collection = name, "creating collection");
            Arc::new(MemoryCollection::new(
                name,
                Arc::clone(&self.online),
                self.batch_size,
            ))
        });
        Ok(Arc::clone(collection) as Arc<dyn Collection>)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
