use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use modkit_docstore::{
    Finder, FinderInserterUpdaterRemover, Inserter, OpContext, Remover, Update, Updater,
};
use modkit_errors::AppResult;
use properties_sdk::{NewOwnerParams, Owner, UpdateOwnerParams};
use tracing::{debug, instrument};

use crate::domain::fields::OwnerFields;
use crate::domain::{OwnerFactory, OwnerRepository};

pub struct DocOwnerRepository {
    store: Arc<dyn FinderInserterUpdaterRemover<Owner>>,
    factory: Arc<OwnerFactory>,
}

impl DocOwnerRepository {
    #[must_use]
    pub fn new(
        store: Arc<dyn FinderInserterUpdaterRemover<Owner>>,
        factory: Arc<OwnerFactory>,
    ) -> Self {
        Self { store, factory }
    }
}

fn owner_update(params: &UpdateOwnerParams) -> Option<Update> {
    let mut update = Update::new();
    for (field, value) in [
        (OwnerFields::NAME, &params.name),
        (OwnerFields::EMAIL, &params.email),
        (OwnerFields::TELEPHONE, &params.telephone),
    ] {
        if !value.is_empty() {
            update = update.set(field, value);
        }
    }
    if update.is_empty() {
        return None;
    }
    Some(update.set(OwnerFields::UPDATED_AT, Utc::now()))
}

#[async_trait]
impl OwnerRepository for DocOwnerRepository {
    #[instrument(skip_all, fields(server = %server))]
    async fn create(
        &self,
        ctx: &OpContext,
        server: &str,
        params: NewOwnerParams,
    ) -> AppResult<Owner> {
        let owner = self.factory.new_owner(params)?;
        self.store.insert_one(ctx, server, &owner).await?;
        debug!(id = %owner.id, "owner created");
        Ok(owner)
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Owner> {
        self.store.find_by_id(ctx, server, id).await
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn update(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        params: UpdateOwnerParams,
    ) -> AppResult<()> {
        let Some(update) = owner_update(&params) else {
            debug!("nothing to update");
            return Ok(());
        };
        self.store.update_one_by_id(ctx, server, id, update).await
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn delete(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<()> {
        self.store.delete_one_by_id(ctx, server, id).await?;
        Ok(())
    }
}
