use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use modkit_cache::Cacher;
use modkit_docstore::OpContext;
use modkit_errors::AppResult;
use properties_sdk::{ListParams, NewPropertyParams, Property, UpdatePropertyParams};
use tracing::instrument;

use super::{CacheLayer, point_key};
use crate::domain::PropertyRepository;

/// Which listing a cached page belongs to.
#[derive(Clone, Copy)]
enum Listing<'a> {
    Category(&'a str),
    Owner(&'a str),
}

fn list_key(server: &str, generation: &str, listing: Listing<'_>, params: &ListParams) -> String {
    let scope = match listing {
        Listing::Category(category) => format!("category/{category}"),
        Listing::Owner(owner_id) => format!("owner/{owner_id}"),
    };
    format!(
        "list:{server}:{generation}:{scope}:{}:{}:{}:{}",
        params.pagination_token, params.search, params.sort, params.limit
    )
}

/// Caching decorator over a [`PropertyRepository`].
pub struct CachedPropertyRepository {
    inner: Arc<dyn PropertyRepository>,
    cache: CacheLayer,
}

impl CachedPropertyRepository {
    #[must_use]
    pub fn new(inner: Arc<dyn PropertyRepository>, cache: Arc<dyn Cacher>, ttl: Duration) -> Self {
        Self {
            inner,
            cache: CacheLayer::new(cache, ttl),
        }
    }

    async fn cached_list(
        &self,
        ctx: &OpContext,
        server: &str,
        listing: Listing<'_>,
        params: &ListParams,
    ) -> AppResult<Vec<Property>> {
        let generation = self.cache.generation(server).await;
        let key = list_key(server, &generation, listing, params);
        if let Some(page) = self.cache.read(&key).await {
            return Ok(page);
        }
        let page = match listing {
            Listing::Category(category) => {
                self.inner
                    .list_by_category(ctx, server, category, params)
                    .await?
            }
            Listing::Owner(owner_id) => {
                self.inner.list_by_owner(ctx, server, owner_id, params).await?
            }
        };
        self.cache.write(&key, &page).await;
        Ok(page)
    }
}

#[async_trait]
impl PropertyRepository for CachedPropertyRepository {
    #[instrument(skip_all, fields(server = %server))]
    async fn create(
        &self,
        ctx: &OpContext,
        server: &str,
        params: NewPropertyParams,
    ) -> AppResult<Property> {
        let property = self.inner.create(ctx, server, params).await?;
        self.cache
            .write(&point_key(server, &property.id), &property)
            .await;
        self.cache.bump_generation(server).await;
        Ok(property)
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Property> {
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
        params: UpdatePropertyParams,
    ) -> AppResult<()> {
        self.inner.update(ctx, server, id, params).await?;
        self.cache.invalidate(server, id).await;
        self.cache.bump_generation(server).await;
        Ok(())
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn delete(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<()> {
        self.inner.delete(ctx, server, id).await?;
        self.cache.invalidate(server, id).await;
        self.cache.bump_generation(server).await;
        Ok(())
    }

    #[instrument(skip_all, fields(server = %server, category = %category))]
    async fn list_by_category(
        &self,
        ctx: &OpContext,
        server: &str,
        category: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>> {
        self.cached_list(ctx, server, Listing::Category(category), params)
            .await
    }

    #[instrument(skip_all, fields(server = %server, owner_id = %owner_id))]
    async fn list_by_owner(
        &self,
        ctx: &OpContext,
        server: &str,
        owner_id: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>> {
        self.cached_list(ctx, server, Listing::Owner(owner_id), params)
            .await
    }
}
