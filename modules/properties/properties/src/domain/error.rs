use thiserror::Error;

use super::{MAX_SCHEMA_VERSION, MIN_SCHEMA_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FactoryConfigError {
    #[error("schema version must be at least {MIN_SCHEMA_VERSION}")]
    MinSchemaVersion,
    #[error("schema version must be at most {MAX_SCHEMA_VERSION}")]
    MaxSchemaVersion,
}

/// A factory was constructed from an invalid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid factory configuration: {0}")]
pub struct InvalidConfigFactory(#[from] pub FactoryConfigError);
