//! Write-side requests and their handlers.

use std::sync::Arc;

use async_trait::async_trait;
use modkit_cqrs::{CommandHandler, StructValidator, apply_command_decorators};
use modkit_docstore::{ObjectId, OpContext};
use modkit_errors::AppResult;
use properties_sdk::{
    NewOwnerParams, NewPropertyParams, UpdateOwnerParams, UpdatePropertyParams, validate_object_id,
};
use validator::Validate;

use crate::domain::{OwnerRepository, PropertyRepository};

#[derive(Debug, Clone, Validate)]
pub struct CreateProperty {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(nested)]
    pub params: NewPropertyParams,
}

impl CreateProperty {
    /// Assigns a fresh id unless `params` already carries one, so the caller knows it up front.
    #[must_use]
    pub fn new(server: impl Into<String>, mut params: NewPropertyParams) -> Self {
        params.id.get_or_insert_with(|| ObjectId::new().to_hex());
        Self {
            server: server.into(),
            params,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.params.id.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Validate)]
pub struct UpdateProperty {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
    #[validate(nested)]
    pub params: UpdatePropertyParams,
}

#[derive(Debug, Clone, Validate)]
pub struct DeleteProperty {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
}

#[derive(Debug, Clone, Validate)]
pub struct CreateOwner {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(nested)]
    pub params: NewOwnerParams,
}

impl CreateOwner {
    /// Assigns a fresh id unless `params` already carries one.
    #[must_use]
    pub fn new(server: impl Into<String>, mut params: NewOwnerParams) -> Self {
        params.id.get_or_insert_with(|| ObjectId::new().to_hex());
        Self {
            server: server.into(),
            params,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.params.id.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Validate)]
pub struct UpdateOwner {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
    #[validate(nested)]
    pub params: UpdateOwnerParams,
}

#[derive(Debug, Clone, Validate)]
pub struct DeleteOwner {
    #[validate(length(min = 1))]
    pub server: String,
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
}

struct CreatePropertyHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl CommandHandler<CreateProperty> for CreatePropertyHandler {
    async fn handle(&self, ctx: &OpContext, command: CreateProperty) -> AppResult<()> {
        self.0
            .create(ctx, &command.server, command.params)
            .await?;
        Ok(())
    }
}

struct UpdatePropertyHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl CommandHandler<UpdateProperty> for UpdatePropertyHandler {
    async fn handle(&self, ctx: &OpContext, command: UpdateProperty) -> AppResult<()> {
        self.0
            .update(ctx, &command.server, &command.id, command.params)
            .await
    }
}

struct DeletePropertyHandler(Arc<dyn PropertyRepository>);

#[async_trait]
impl CommandHandler<DeleteProperty> for DeletePropertyHandler {
    async fn handle(&self, ctx: &OpContext, command: DeleteProperty) -> AppResult<()> {
        self.0
            .delete(ctx, &command.server, &command.id)
            .await
    }
}

struct CreateOwnerHandler(Arc<dyn OwnerRepository>);

#[async_trait]
impl CommandHandler<CreateOwner> for CreateOwnerHandler {
    async fn handle(&self, ctx: &OpContext, command: CreateOwner) -> AppResult<()> {
        self.0
            .create(ctx, &command.server, command.params)
            .await?;
        Ok(())
    }
}

struct UpdateOwnerHandler(Arc<dyn OwnerRepository>);

#[async_trait]
impl CommandHandler<UpdateOwner> for UpdateOwnerHandler {
    async fn handle(&self, ctx: &OpContext, command: UpdateOwner) -> AppResult<()> {
        self.0
            .update(ctx, &command.server, &command.id, command.params)
            .await
    }
}

struct DeleteOwnerHandler(Arc<dyn OwnerRepository>);

#[async_trait]
impl CommandHandler<DeleteOwner> for DeleteOwnerHandler {
    async fn handle(&self, ctx: &OpContext, command: DeleteOwner) -> AppResult<()> {
        self.0
            .delete(ctx, &command.server, &command.id)
            .await
    }
}

fn decorated<C, H>(handler: H) -> Arc<dyn CommandHandler<C>>
where
    C: Validate + Send + Sync + 'static,
    H: CommandHandler<C> + 'static,
{
    apply_command_decorators(Arc::new(handler), Arc::new(StructValidator))
}

/// Every command handler, each served through the decoration pipeline.
#[derive(Clone)]
pub struct Commands {
    pub create_property: Arc<dyn CommandHandler<CreateProperty>>,
    pub update_property: Arc<dyn CommandHandler<UpdateProperty>>,
    pub delete_property: Arc<dyn CommandHandler<DeleteProperty>>,
    pub create_owner: Arc<dyn CommandHandler<CreateOwner>>,
    pub update_owner: Arc<dyn CommandHandler<UpdateOwner>>,
    pub delete_owner: Arc<dyn CommandHandler<DeleteOwner>>,
}

impl Commands {
    #[must_use]
    pub fn new(
        properties: &Arc<dyn PropertyRepository>,
        owners: &Arc<dyn OwnerRepository>,
    ) -> Self {
        Self {
            create_property: decorated(CreatePropertyHandler(Arc::clone(properties))),
            update_property: decorated(UpdatePropertyHandler(Arc::clone(properties))),
            delete_property: decorated(DeletePropertyHandler(Arc::clone(properties))),
            create_owner: decorated(CreateOwnerHandler(Arc::clone(owners))),
            update_owner: decorated(UpdateOwnerHandler(Arc::clone(owners))),
            delete_owner: decorated(DeleteOwnerHandler(Arc::clone(owners))),
        }
    }
}
