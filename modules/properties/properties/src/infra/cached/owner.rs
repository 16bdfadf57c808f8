use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modkit_cache::Cacher;
use modkit_docstore::OpContext;
use modkit_errors::AppResult;
use properties_sdk::{NewOwnerParams, Owner, UpdateOwnerParams};
use tracing::instrument;

use super::{CacheLayer, point_key};
use crate::domain::OwnerRepository;

/// Caching decorator over an [`OwnerRepository`].
pub struct CachedOwnerRepository {
    inner: Arc<dyn OwnerRepository>,
    cache: CacheLayer,
}

impl CachedOwnerRepository {
    #[must_use]
    pub fn new(inner: Arc<dyn OwnerRepository>, cache: Arc<dyn Cacher>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: CacheLayer::new(cache, ttl),
        }
    }
}

#[async_trait]
impl OwnerRepository for CachedOwnerRepository {
    #[instrument(skip_all, fields(server = %server))]
    async fn create(
        &self,
        ctx: &OpContext,
        server: &str,
        params: NewOwnerParams,
    ) -> AppResult<Owner> {
        let owner = self.inner.create(ctx, server, params).await?;
        self.cache.write(&point_key(server, &owner.id), &owner).await;
        Ok(owner)
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Owner> {
        self.cache
            .read_through(server, id, self.inner.get(ctx, server, id))
            .await
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn update(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        params: UpdateOwnerParams,
    ) -> AppResult<()> {
        self.inner.update(ctx, server, id, params).await?;
        self.cache.invalidate(server, id).await;
        Ok(())
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn delete(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<()> {
        self.inner.delete(ctx, server, id).await?;
        self.cache.invalidate(server, id).await;
        Ok(())
    }
}
