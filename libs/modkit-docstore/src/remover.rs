use async_trait::async_trait;
use modkit_errors::AppError;
use tracing::debug;

use crate::collection::{DocCollection, parse_object_id};
use crate::context::OpContext;
use crate::factory::Factory;
use crate::filter::Filter;
use crate::query::KEYSET_FIELD;

#[async_trait]
pub trait Remover<T: Send + Sync + 'static>: Send + Sync {
    /// Delete the first record matching `filter`; returns the number deleted.
    ///
    /// # Errors
    /// `NotFound` when nothing was deleted, otherwise store failures.
    async fn delete_one(&self, ctx: &OpContext, server: &str, filter: Filter)
    -> Result<u64, AppError>;

    /// # Errors
    /// `InvalidArgument` for a malformed id, `NotFound` when absent.
    async fn delete_one_by_id(&self, ctx: &OpContext, server: &str, id: &str)
    -> Result<u64, AppError>;
}

#[async_trait]
impl<F: Factory> Remover<F::Domain> for DocCollection<F> {
    async fn delete_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
    ) -> Result<u64, AppError> {
        let collection = self.resolve(server)?;
        let deleted = ctx.run(collection.delete_one(&filter)).await?;
        if deleted == 0 {
            return Err(AppError::not_found(format!(
                "no record to delete in '{}'",
                collection.name()
            )));
        }
        debug!(collection = collection.name(), deleted, "deleted record");
        Ok(deleted)
    }

    async fn delete_one_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<u64, AppError> {
        let filter = Filter::eq(KEYSET_FIELD, parse_object_id(id)?);
        self.delete_one(ctx, server, filter).await
    }
}
