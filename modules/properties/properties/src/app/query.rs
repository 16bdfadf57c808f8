//! Read-side requests and their handlers.

use std::sync::Arc;

use async_trait::async_trait;
use modkit_cqrs::{QueryHandler, StructValidator, apply_query_decorators};
use modkit_docstore::OpContext;
use modkit_errors::AppResult;
use properties_sdk::{ListParams, Owner, Property, PropertyPage, validate_object_id};
use validator::Validate;

use crate::domain::{OwnerRepository, PropertyRepository};

#[derive(Debug, Clone, Validate)]
pub struct GetProperty {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
}

#[derive(Debug, Clone, Validate)]
pub struct GetOwner {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
}

#[derive(Debug, Clone, Validate)]
pub struct ListPropertiesByCategory {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(nested)]
    pub params: ListParams,
}

#[derive(Debug, Clone, Validate)]
pub struct ListPropertiesByOwner {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub owner_id: String,
    #[validate(nested)]
    pub params: ListParams,
}

struct GetPropertyHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl QueryHandler<GetProperty, Property> for GetPropertyHandler {
    async fn handle(&self, ctx: &OpContext, query: GetProperty) -> AppResult<Property> {
        self.0.get(ctx, &query.server, &query.id).await
    }
}

struct GetOwnerHandler(Arc<dyn OwnerRepository>);

#[async_trait]
impl QueryHandler<GetOwner, Owner> for GetOwnerHandler {
    async fn handle(&self, ctx: &OpContext, query: GetOwner) -> AppResult<Owner> {
        self.0.get(ctx, &query.server, &query.id).await
    }
}

struct ListByCategoryHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl QueryHandler<ListPropertiesByCategory, PropertyPage> for ListByCategoryHandler {
    async fn handle(
        &self,
        ctx: &OpContext,
        query: ListPropertiesByCategory,
    ) -> AppResult<PropertyPage> {
        let properties = self
            .0
            .list_by_category(ctx, &query.server, &query.category, &query.params)
            .await?;
        Ok(PropertyPage { properties })
    }
}

struct ListByOwnerHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl QueryHandler<ListPropertiesByOwner, PropertyPage> for ListByOwnerHandler {
    async fn handle(
        &self,
        ctx: &OpContext,
        query: ListPropertiesByOwner,
    ) -> AppResult<PropertyPage> {
        let properties = self
            .0
            .list_by_owner(ctx, &query.server, &query.owner_id, &query.params)
            .await?;
        Ok(PropertyPage { properties })
    }
}

fn decorated<Q, R, H>(handler: H) -> Arc<dyn QueryHandler<Q, R>>
where
    Q: Validate + Send + Sync + 'static,
    R: Validate + Send + 'static,
    H: QueryHandler<Q, R> + 'static,
{
    apply_query_decorators(
        Arc::new(handler),
        Arc::new(StructValidator),
        Arc::new(StructValidator),
    )
}

/// Every query handler, each served through the decoration pipeline.
#[derive(Clone)]
pub struct Queries {
    pub get_property: Arc<dyn QueryHandler<GetProperty, Property>>,
    pub get_owner: Arc<dyn QueryHandler<GetOwner, Owner>>,
    pub list_by_category: Arc<dyn QueryHandler<ListPropertiesByCategory, PropertyPage>>,
    pub list_by_owner: Arc<dyn QueryHandler<ListPropertiesByOwner, PropertyPage>>,
}

impl Queries {
    #[must_use]
    pub fn new(
        properties: &Arc<dyn PropertyRepository>,
        owners: &Arc<dyn OwnerRepository>,
    ) -> Self {
        Self {
            get_property: decorated(GetPropertyHandler(Arc::clone(properties))),
            get_owner: decorated(GetOwnerHandler(Arc::clone(owners))),
            list_by_category: decorated(ListByCategoryHandler(Arc::clone(properties))),
            list_by_owner: decorated(ListByOwnerHandler(Arc::clone(properties))),
        }
    }
}
