//! Store collaborator contracts.
//!
//! A backend implements [`Connector`], [`Collection`] and [`DocCursor`]; everything above this
//! module is written against these traits only.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::filter::{Filter, Update};
use crate::options::{FindOptions, IndexModel, ReturnDocument, UpdateResult};
use crate::pipeline::Pipeline;
use crate::value::{Document, Value};

/// Shared handle to a database. Safe for concurrent use across repositories.
#[async_trait]
pub trait Connector: Send + Sync {
    fn database_name(&self) -> &str;

    /// Resolve an existing collection.
    ///
    /// # Errors
    /// [`StoreError::CollectionNotFound`] if the collection does not exist.
    fn collection(&self, name: &str) -> Result<Arc<dyn Collection>, StoreError>;

    /// Create a collection, returning the existing one if already present.
    async fn create_collection(&self, name: &str) -> Result<Arc<dyn Collection>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Box<dyn DocCursor>, StoreError>;

    async fn find_one(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert a document, generating `_id` when absent. Returns the stored `_id`.
    async fn insert_one(&self, doc: Document) -> Result<Value, StoreError>;

    async fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError>;

    async fn replace_one(
        &self,
        filter: &Filter,
        replacement: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError>;

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        ret: ReturnDocument,
    ) -> Result<Option<Document>, StoreError>;

    /// Delete the first matching document; returns the number deleted.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Box<dyn DocCursor>, StoreError>;

    async fn create_index(&self, index: IndexModel) -> Result<String, StoreError>;
}

/// Batched cursor over raw documents.
#[async_trait]
pub trait DocCursor: Send {
    /// Next batch, or `None` once exhausted.
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>, StoreError>;

    /// Release server-side resources. Further calls yield `None`.
    fn close(&mut self);
}
