use async_trait::async_trait;
use modkit_docstore::OpContext;
use modkit_errors::AppResult;

/// Executes a state-changing request under the caller's context.
#[async_trait]
pub trait CommandHandler<C: Send + 'static>: Send + Sync {
    /// # Errors
    /// Whatever the command's execution classifies; `Database` once `ctx` is cancelled.
    async fn handle(&self, ctx: &OpContext, command: C) -> AppResult<()>;
}

/// Answers a read-only request under the caller's context.
#[async_trait]
pub trait QueryHandler<Q: Send + 'static, R: Send + 'static>: Send + Sync {
    /// # Errors
    /// Whatever the query's execution classifies; `Database` once `ctx` is cancelled.
    async fn handle(&self, ctx: &OpContext, query: Q) -> AppResult<R>;
}
