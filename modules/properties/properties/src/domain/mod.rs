//! Domain records, their storage mapping and the repository contracts.

pub mod error;
pub mod fields;
pub mod owner;
pub mod property;
pub mod repo;

use modkit_errors::{AppError, ErrorKind, Layer};
use validator::ValidationErrors;

pub use error::{FactoryConfigError, InvalidConfigFactory};
pub use owner::{OwnerFactory, OwnerRecord};
pub use property::{PropertyFactory, PropertyRecord};
pub use repo::{OwnerRepository, PropertyRepository};

pub const MIN_SCHEMA_VERSION: u32 = 1;
pub const MAX_SCHEMA_VERSION: u32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoryConfig {
    pub schema_version: u32,
}

impl FactoryConfig {
    /// # Errors
    /// When the schema version falls outside `1..=9999`.
    pub fn validate(self) -> Result<(), FactoryConfigError> {
        if self.schema_version < MIN_SCHEMA_VERSION {
            return Err(FactoryConfigError::MinSchemaVersion);
        }
        if self.schema_version > MAX_SCHEMA_VERSION {
            return Err(FactoryConfigError::MaxSchemaVersion);
        }
        Ok(())
    }
}

/// A domain record handed in by a caller broke a rule.
fn rejected(errs: ValidationErrors) -> AppError {
    AppError::new(ErrorKind::InvalidArgument, Layer::Domain, errs)
}

/// A stored record no longer satisfies the domain rules.
fn corrupt(errs: ValidationErrors) -> AppError {
    AppError::internal(errs)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn schema_version_bounds() {
        assert!(FactoryConfig { schema_version: 1 }.validate().is_ok());
        assert!(FactoryConfig { schema_version: 9999 }.validate().is_ok());
        assert_eq!(
            FactoryConfig { schema_version: 0 }.validate(),
            Err(FactoryConfigError::MinSchemaVersion)
        );
        assert_eq!(
            FactoryConfig {
                schema_version: 10_000
            }
            .validate(),
            Err(FactoryConfigError::MaxSchemaVersion)
        );
    }
}
