use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use modkit_docstore::collection::parse_object_id;
use modkit_docstore::pagination::{SearchDirection, equals_search, text_search};
use modkit_docstore::{
    DocumentStore, Finder, Grouper, Inserter, MetaField, OpContext, Pipeline, Projection, Remover,
    SortDir, SortSpec, Stage, Update, Updater, Value,
};
use modkit_errors::AppResult;
use properties_sdk::{ListParams, NewPropertyParams, Property, UpdatePropertyParams};
use tracing::{debug, instrument};

use super::ListingConfig;
use crate::domain::fields::PropertyFields;
use crate::domain::{PropertyFactory, PropertyRepository};

pub struct DocPropertyRepository {
    store: Arc<dyn DocumentStore<Property>>,
    factory: Arc<PropertyFactory>,
    listing: ListingConfig,
}

impl DocPropertyRepository {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore<Property>>,
        factory: Arc<PropertyFactory>,
        listing: ListingConfig,
    ) -> Self {
        Self {
            store,
            factory,
            listing,
        }
    }

    async fn list(
        &self,
        ctx: &OpContext,
        server: &str,
        search: Stage,
        limit: u64,
    ) -> AppResult<Vec<Property>> {
        let mut pipeline = Pipeline::new().stage(search);
        let size = self.listing.page_size(limit);
        if size > 0 {
            pipeline = pipeline.stage(Stage::Limit(size));
        }
        let pipeline = pipeline.stage(Stage::Project(listing_projection()));

        let mut records = self.store.aggregate(ctx, server, pipeline).await?;
        let page = records.get_all(ctx).await?;
        debug!(count = page.len(), "listed properties");
        Ok(page)
    }
}

/// Title order with `_id` breaking ties in the same direction.
fn title_order(sort: i64) -> SortSpec {
    let dir = SortDir::from_order(sort).unwrap_or(SortDir::Asc);
    vec![
        (PropertyFields::TITLE.to_owned(), dir),
        (PropertyFields::ID.to_owned(), dir),
    ]
}

fn listing_projection() -> Projection {
    Projection::new()
        .include_all(PropertyFields::LISTED)
        .meta(PropertyFields::PAGINATION_TOKEN, MetaField::SearchSequenceToken)
}

/// Store update for the supplied fields, or `None` when nothing would change.
fn property_update(params: &UpdatePropertyParams) -> Option<Update> {
    let text = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(Value::from);
    let sets = [
        (PropertyFields::AVAILABLE, params.available.map(Value::from)),
        (
            PropertyFields::AVAILABLE_DATE,
            params.available_date.map(Value::from),
        ),
        (PropertyFields::DESCRIPTION, text(params.description.as_deref())),
        (PropertyFields::TITLE, text(params.title.as_deref())),
        (PropertyFields::CATEGORY, text(params.category.as_deref())),
        (PropertyFields::ADDRESS, text(params.address.as_deref())),
        (
            PropertyFields::SALE_TYPE,
            (!params.sale_type.is_unknown()).then(|| Value::from(i64::from(params.sale_type.code()))),
        ),
    ];
    let update = sets
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .fold(Update::new(), |update, (field, value)| update.set(field, value));
    if update.is_empty() {
        return None;
    }
    Some(update.set(PropertyFields::UPDATED_AT, Utc::now()))
}

#[async_trait]
impl PropertyRepository for DocPropertyRepository {
    #[instrument(skip_all, fields(server = %server))]
    async fn create(
        &self,
        ctx: &OpContext,
        server: &str,
        params: NewPropertyParams,
    ) -> AppResult<Property> {
        let property = self.factory.new_property(params)?;
        self.store.insert_one(ctx, server, &property).await?;
        debug!(id = %property.id, "property created");
        Ok(property)
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn get(&self, ctx: &OpContext, server: &str, id: &str) -> AppResult<Property> {
        self.store.find_by_id(ctx, server, id).await
    }

    #[instrument(skip_all, fields(server = %server, id = %id))]
    async fn update(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        params: UpdatePropertyParams,
    ) -> AppResult<()> {
        let Some(update) = property_update(&params) else {
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

    #[instrument(skip_all, fields(server = %server, category = %category))]
    async fn list_by_category(
        &self,
        ctx: &OpContext,
        server: &str,
        category: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>> {
        let search = text_search(
            &self.listing.search_index,
            PropertyFields::CATEGORY,
            category,
            title_order(params.sort),
            SearchDirection::from_code(params.search),
            &params.pagination_token,
        );
        self.list(ctx, server, search, params.limit).await
    }

    #[instrument(skip_all, fields(server = %server, owner_id = %owner_id))]
    async fn list_by_owner(
        &self,
        ctx: &OpContext,
        server: &str,
        owner_id: &str,
        params: &ListParams,
    ) -> AppResult<Vec<Property>> {
        let owner = parse_object_id(owner_id)?;
        let search = equals_search(
            &self.listing.search_index,
            PropertyFields::OWNER_ID,
            owner,
            title_order(params.sort),
            SearchDirection::from_code(params.search),
            &params.pagination_token,
        );
        self.list(ctx, server, search, params.limit).await
    }
}
