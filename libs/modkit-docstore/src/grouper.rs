use async_trait::async_trait;
use modkit_errors::AppError;

use crate::collection::DocCollection;
use crate::context::OpContext;
use crate::factory::Factory;
use crate::iterator::RecordIterator;
use crate::pipeline::Pipeline;

#[async_trait]
pub trait Grouper<T: Send + Sync + 'static>: Send + Sync {
    /// Run `pipeline` against the server's collection.
    ///
    /// # Errors
    /// `CollectionNotFound`, an internal error for a malformed pipeline, an invalid argument
    /// for a bad pagination token, or store failures.
    async fn aggregate(
        &self,
        ctx: &OpContext,
        server: &str,
        pipeline: Pipeline,
    ) -> Result<RecordIterator<T>, AppError>;
}

#[async_trait]
impl<F: Factory> Grouper<F::Domain> for DocCollection<F> {
    async fn aggregate(
        &self,
        ctx: &OpContext,
        server: &str,
        pipeline: Pipeline,
    ) -> Result<RecordIterator<F::Domain>, AppError> {
        let collection = self.resolve(server)?;
        let cursor = ctx.run(collection.aggregate(&pipeline)).await?;
        Ok(RecordIterator::new(cursor, self.factory.clone()))
    }
}
