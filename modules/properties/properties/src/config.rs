use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{FactoryConfig, FactoryConfigError};

/// `Duration` as a human-readable string such as `10m` or `1h 30m`.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}

/// Environment variables with this prefix override file and default values.
pub const ENV_PREFIX: &str = "PROPERTIES__";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("{0} must not be empty")]
    EmptySuffix(&'static str),

    #[error("cache_ttl must be greater than zero")]
    ZeroTtl,

    #[error("default_list_limit {default} exceeds max_list_limit {max}")]
    ListLimits { default: u64, max: u64 },

    #[error(transparent)]
    SchemaVersion(#[from] FactoryConfigError),
}

/// Properties module configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertiesConfig {
    /// Database the connector is expected to serve.
    pub database: String,

    /// Appended to a server name to form its property collection.
    pub property_collection_suffix: String,

    /// Appended to a server name to form its owner collection.
    pub owner_collection_suffix: String,

    /// Lifetime of cached records and listings.
    #[serde(with = "duration_serde")]
    pub cache_ttl: Duration,

    /// Search index used by the listings.
    pub search_index: String,

    pub default_list_limit: u64,
    pub max_list_limit: u64,

    pub schema_version: u32,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            database: "property_service".to_owned(),
            property_collection_suffix: "_properties".to_owned(),
            owner_collection_suffix: "_owners".to_owned(),
            cache_ttl: Duration::from_secs(600),
            search_index: "default".to_owned(),
            default_list_limit: 25,
            max_list_limit: 1000,
            schema_version: 1,
        }
    }
}

impl PropertiesConfig {
    /// Defaults, then the YAML file at `path` if given, then `PROPERTIES__*` variables.
    ///
    /// # Errors
    /// [`ConfigError::Load`] for unreadable or mistyped sources, or any [`Self::validate`]
    /// failure.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// # Errors
    /// [`ConfigError::Load`] when extraction fails, or any [`Self::validate`] failure.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// The first rule the configuration breaks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.property_collection_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix("property_collection_suffix"));
        }
        if self.owner_collection_suffix.is_empty() {
            return Err(ConfigError::EmptySuffix("owner_collection_suffix"));
        }
        if self.cache_ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.default_list_limit > self.max_list_limit {
            return Err(ConfigError::ListLimits {
                default: self.default_list_limit,
                max: self.max_list_limit,
            });
        }
        self.factory_config().validate()?;
        Ok(())
    }

    #[must_use]
    pub fn factory_config(&self) -> FactoryConfig {
        FactoryConfig {
            schema_version: self.schema_version,
        }
    }
}
