use async_trait::async_trait;
use modkit_errors::AppError;
use tracing::debug;

use crate::collection::DocCollection;
use crate::context::OpContext;
use crate::factory::{Factory, encode};
use crate::value::Value;

#[async_trait]
pub trait Inserter<T: Send + Sync + 'static>: Send + Sync {
    /// Store `record` and return its identifier as hex.
    ///
    /// # Errors
    /// Mapping failures, `CollectionNotFound`, or store failures (a duplicate key is a
    /// database error).
    async fn insert_one(&self, ctx: &OpContext, server: &str, record: &T)
    -> Result<String, AppError>;
}

#[async_trait]
impl<F: Factory> Inserter<F::Domain> for DocCollection<F> {
    async fn insert_one(
        &self,
        ctx: &OpContext,
        server: &str,
        record: &F::Domain,
    ) -> Result<String, AppError> {
        let doc = encode(self.factory.as_ref(), record)?;
        let collection = self.resolve(server)?;
        let id = ctx.run(collection.insert_one(doc)).await?;
        let id = match id {
            Value::ObjectId(oid) => oid.to_hex(),
            Value::String(s) => s,
            _ => {
                return Err(AppError::internal(anyhow::anyhow!(
                    "store returned a non-hex identifier"
                )));
            }
        };
        debug!(collection = collection.name(), id = %id, "inserted record");
        Ok(id)
    }
}
