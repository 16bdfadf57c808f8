//! Public models for the properties module.
//!
//! Identifiers are 24-character hexadecimal strings. Records are validated with the same rules
//! whether they are built from parameters, read back from storage or returned to a caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::validation::validate_object_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SaleType {
    #[default]
    Unknown,
    ForRent,
    ForSale,
    ForBoth,
}

impl SaleType {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::ForRent => 1,
            Self::ForSale => 2,
            Self::ForBoth => 3,
        }
    }

    #[must_use]
    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sale type {0} is outside 0..=3")]
pub struct InvalidSaleType(pub u8);

impl TryFrom<u8> for SaleType {
    type Error = InvalidSaleType;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::ForRent),
            2 => Ok(Self::ForSale),
            3 => Ok(Self::ForBoth),
            other => Err(InvalidSaleType(other)),
        }
    }
}

impl From<SaleType> for u8 {
    fn from(sale: SaleType) -> Self {
        sale.code()
    }
}

/// Record lifecycle timestamps. `updated_at` stays at the Unix epoch until the first mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Metadata {
    #[must_use]
    pub fn created_now() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[must_use]
    pub fn was_updated(&self) -> bool {
        self.updated_at != DateTime::<Utc>::UNIX_EPOCH
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
    #[validate(custom(function = "validate_object_id"))]
    pub owner_id: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub title: String,
    pub metadata: Metadata,
    pub available: bool,
    pub available_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub address: String,
    pub sale_type: SaleType,
    /// Position of this record within a listing; only set on listed records.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagination_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[validate(custom(function = "validate_object_id"))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub telephone: String,
    pub metadata: Metadata,
}

/// One page of a property listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PropertyPage {
    #[validate(nested)]
    pub properties: Vec<Property>,
}

impl PropertyPage {
    /// Token to pass with `search = 1` for the next page.
    #[must_use]
    pub fn last_token(&self) -> Option<&str> {
        self.properties
            .last()
            .map(|p| p.pagination_token.as_str())
            .filter(|t| !t.is_empty())
    }
}
