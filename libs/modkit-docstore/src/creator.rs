use async_trait::async_trait;
use modkit_errors::AppError;
use tracing::info;

use crate::collection::DocCollection;
use crate::context::OpContext;
use crate::factory::Factory;
use crate::options::IndexModel;

/// Provisioning of a server's collection and its indexes.
#[async_trait]
pub trait Creator: Send + Sync {
    /// Create the server's collection; succeeds if it already exists.
    ///
    /// # Errors
    /// Store failures.
    async fn create_collection(&self, ctx: &OpContext, server: &str) -> Result<(), AppError>;

    /// Create `index` on the server's collection and return its name.
    ///
    /// # Errors
    /// `CollectionNotFound`, or a database error when existing records violate a unique index.
    async fn create_index(
        &self,
        ctx: &OpContext,
        server: &str,
        index: IndexModel,
    ) -> Result<String, AppError>;
}

#[async_trait]
impl<F: Factory> Creator for DocCollection<F> {
    async fn create_collection(&self, ctx: &OpContext, server: &str) -> Result<(), AppError> {
        let name = self.collection_name(server);
        ctx.run(self.connector.create_collection(&name)).await?;
        info!(collection = %name, "collection ready");
        Ok(())
    }

    async fn create_index(
        &self,
        ctx: &OpContext,
        server: &str,
        index: IndexModel,
    ) -> Result<String, AppError> {
        let collection = self.resolve(server)?;
        Ok(ctx.run(collection.create_index(index)).await?)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::inserter::Inserter;
    use crate::memory::MemoryConnector;
    use crate::options::SortDir;
    use crate::testing::{NoteFactory, note};
    use modkit_errors::ErrorKind;
    use std::sync::Arc;

    #[tokio::test]
    async fn provisions_collection_and_unique_index() {
        let conn = Arc::new(MemoryConnector::new("db"));
        let notes = DocCollection::new(conn.clone(), Arc::new(NoteFactory), "_notes");
        let ctx = OpContext::new();

        let err = notes
            .create_index(&ctx, "eu", IndexModel::new("seq").key("Seq", SortDir::Asc))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CollectionNotFound);

        notes.create_collection(&ctx, "eu").await.unwrap();
        notes.create_collection(&ctx, "eu").await.unwrap();
        assert_eq!(conn.collection_names(), vec!["eu_notes".to_owned()]);

        let name = notes
            .create_index(&ctx, "eu", IndexModel::new("seq").key("Seq", SortDir::Asc).unique())
            .await
            .unwrap();
        assert_eq!(name, "seq");

        notes.insert_one(&ctx, "eu", &note(1, "a")).await.unwrap();
        let err = notes.insert_one(&ctx, "eu", &note(1, "b")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Database);
    }
}
