//! A typed handle on the `<server><suffix>` collections of one aggregate.

use std::sync::Arc;

use modkit_errors::{AppError, ErrorKind};

use crate::factory::Factory;
use crate::helper::QueryHelper;
use crate::oid::ObjectId;
use crate::store::{Collection, Connector};

/// Implements every capability contract for the domain type of `F`.
///
/// Each server owns its own collection, named by appending the aggregate's suffix to the
/// server name.
pub struct DocCollection<F> {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) factory: Arc<F>,
    pub(crate) suffix: String,
    pub(crate) helper: QueryHelper,
}

impl<F> Clone for DocCollection<F> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            factory: Arc::clone(&self.factory),
            suffix: self.suffix.clone(),
            helper: self.helper.clone(),
        }
    }
}

impl<F: Factory> DocCollection<F> {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, factory: Arc<F>, suffix: impl Into<String>) -> Self {
        Self {
            connector,
            factory,
            suffix: suffix.into(),
            helper: QueryHelper::default(),
        }
    }

    /// Use `helper` for time-range queries instead of the default date field.
    #[must_use]
    pub fn with_helper(mut self, helper: QueryHelper) -> Self {
        self.helper = helper;
        self
    }

    #[must_use]
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    #[must_use]
    pub fn collection_name(&self, server: &str) -> String {
        format!("{server}{}", self.suffix)
    }

    /// # Errors
    /// [`ErrorKind::CollectionNotFound`] when the server's collection does not exist.
    pub fn resolve(&self, server: &str) -> Result<Arc<dyn Collection>, AppError> {
        Ok(self.connector.collection(&self.collection_name(server))?)
    }
}

/// Parse a hex identifier supplied by a caller.
///
/// # Errors
/// A repository-layer [`ErrorKind::InvalidArgument`] when `id` is not 24 hex characters.
pub fn parse_object_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|err| AppError::repository(ErrorKind::InvalidArgument, err))
}
