use async_trait::async_trait;
use modkit_docstore::OpContext;
use modkit_errors::AppResult;
use properties_sdk::{
    ListParams, NewOwnerParams, NewPropertyParams, Owner, Property, UpdateOwnerParams,
    UpdatePropertyParams,
};

/// Property records of one server at a time.
///
/// Implemented by the store-backed facade and by the caching decorator wrapped around it.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    async fn create(
        &self,
        ctx: &OpContext,
        server: &str,
        params: NewPropertyParams,
    ) -> AppResult<Property>;

    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Property>;

    /// Apply the non-empty fields of `params`. Nothing to apply is a successful no-op.
    async fn update(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        params: UpdatePropertyParams,
    ) -> AppResult<()>;

    async fn delete(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<()>;

    async fn list_by_category(
        &self,
        ctx: &OpContext,
        server: &str,
        category: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>>;

    async fn list_by_owner(
        &self,
        ctx: &OpContext,
        server: &str,
        owner_id: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>>;
}

#[async_trait]
pub trait OwnerRepository: Send + Sync {
    async fn create(&self, ctx: &OpContext, server: &str, params: NewOwnerParams)
    -> AppResult<Owner>;

    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Owner>;

    /// Apply the non-empty fields of `params`. Nothing to apply is a successful no-op.
    async fn update(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        params: UpdateOwnerParams,
    ) -> AppResult<()>;

    async fn delete(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<()>;
}
