use std::sync::Arc;

use anyhow::Context;
use modkit_cache::Cacher;
use modkit_docstore::{
    Connector, Creator, DocCollection, DocumentStore, FinderInserterUpdaterRemover, IndexModel,
    OpContext, SortDir,
};
use modkit_errors::{AppError, AppResult, ErrorKind, Layer};
use properties_sdk::{Owner, Property};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::Application;
use crate::config::PropertiesConfig;
use crate::domain::fields::{OwnerFields, PropertyFields};
use crate::domain::{OwnerFactory, OwnerRepository, PropertyFactory, PropertyRepository};
use crate::infra::cached::{CachedOwnerRepository, CachedPropertyRepository};
use crate::infra::storage::{DocOwnerRepository, DocPropertyRepository, ListingConfig};

pub const OWNER_INDEX: &str = "owner_id";
pub const EMAIL_INDEX: &str = "owner_email";

/// The properties module: configuration, storage, caching and the application layer wired
/// together over a shared connector and cache.
pub struct PropertiesModule {
    config: PropertiesConfig,
    connector: Arc<dyn Connector>,
    cacher: Arc<dyn Cacher>,
    properties: Arc<DocCollection<PropertyFactory>>,
    owners: Arc<DocCollection<OwnerFactory>>,
    app: Application,
}

impl PropertiesModule {
    /// # Errors
    /// When `config` is invalid.
    pub fn new(
        config: PropertiesConfig,
        connector: Arc<dyn Connector>,
        cacher: Arc<dyn Cacher>,
    ) -> anyhow::Result<Self> {
        info!("Initializing properties module");
        config
            .validate()
            .context("invalid properties configuration")?;

        if connector.database_name() != config.database {
            warn!(
                expected = %config.database,
                actual = %connector.database_name(),
                "connector serves a different database"
            );
        }

        let property_factory = Arc::new(PropertyFactory::new(config.factory_config())?);
        let owner_factory = Arc::new(OwnerFactory::new(config.factory_config())?);

        let properties = Arc::new(DocCollection::new(
            Arc::clone(&connector),
            Arc::clone(&property_factory),
            config.property_collection_suffix.clone(),
        ));
        let owners = Arc::new(DocCollection::new(
            Arc::clone(&connector),
            Arc::clone(&owner_factory),
            config.owner_collection_suffix.clone(),
        ));

        let property_store: Arc<dyn DocumentStore<Property>> = properties.clone();
        let owner_store: Arc<dyn FinderInserterUpdaterRemover<Owner>> = owners.clone();
        let listing = ListingConfig {
            search_index: config.search_index.clone(),
            default_limit: config.default_list_limit,
            max_limit: config.max_list_limit,
        };

        let property_repo: Arc<dyn PropertyRepository> = Arc::new(CachedPropertyRepository::new(
            Arc::new(DocPropertyRepository::new(
                property_store,
                property_factory,
                listing,
            )),
            Arc::clone(&cacher),
            config.cache_ttl,
        ));
        let owner_repo: Arc<dyn OwnerRepository> = Arc::new(CachedOwnerRepository::new(
            Arc::new(DocOwnerRepository::new(owner_store, owner_factory)),
            Arc::clone(&cacher),
            config.cache_ttl,
        ));
        let app = Application::new(&property_repo, &owner_repo);

        info!("Properties module initialized");
        Ok(Self {
            config,
            connector,
            cacher,
            properties,
            owners,
            app,
        })
    }

    #[must_use]
    pub fn app(&self) -> &Application {
        &self.app
    }

    #[must_use]
    pub fn config(&self) -> &PropertiesConfig {
        &self.config
    }

    /// Create the collections and indexes `server` needs. Safe to repeat.
    ///
    /// # Errors
    /// Store failures, or a `Database` error when existing owners share an email.
    pub async fn provision(&self, server: &str) -> AppResult<()> {
        let ctx = OpContext::new();
        self.properties.create_collection(&ctx, server).await?;
        self.properties
            .create_index(
                &ctx,
                server,
                IndexModel::new(OWNER_INDEX).key(PropertyFields::OWNER_ID, SortDir::Asc),
            )
            .await?;

        self.owners.create_collection(&ctx, server).await?;
        self.owners
            .create_index(
                &ctx,
                server,
                IndexModel::new(EMAIL_INDEX)
                    .key(OwnerFields::EMAIL, SortDir::Asc)
                    .unique(),
            )
            .await?;

        info!(server, "server provisioned");
        Ok(())
    }

    /// # Errors
    /// A `Database` error when the store is unreachable, or an infrastructure `Internal` error
    /// when the cache is.
    pub async fn health_check(&self) -> AppResult<()> {
        self.connector.ping().await?;
        self.cacher
            .health_check()
            .await
            .map_err(|err| AppError::new(ErrorKind::Internal, Layer::Infrastructure, err))
    }
}

/// Install a formatting subscriber filtered by `RUST_LOG`, falling back to `default_filter`.
///
/// # Errors
/// When a global subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
