//! Operation parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::SaleType;
use crate::validation::{validate_email_or_empty, validate_object_id};

/// Input for creating a property. A missing `id` is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewPropertyParams {
    #[validate(custom(function = "validate_object_id"))]
    #[serde(default)]
    pub id: Option<String>,
    #[validate(custom(function = "validate_object_id"))]
    pub owner_id: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(min = 1))]
    pub title: String,
    pub available: bool,
    pub available_date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub address: String,
    pub sale_type: SaleType,
}

/// Partial property update. `None`, empty strings and [`SaleType::Unknown`] leave the stored
/// value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdatePropertyParams {
    pub available: Option<bool>,
    pub available_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub address: Option<String>,
    pub sale_type: SaleType,
}

impl UpdatePropertyParams {
    /// True when applying these parameters would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let blank = |field: &Option<String>| field.as_deref().is_none_or(str::is_empty);
        self.available.is_none()
            && self.available_date.is_none()
            && blank(&self.description)
            && blank(&self.title)
            && blank(&self.category)
            && blank(&self.address)
            && self.sale_type.is_unknown()
    }
}

/// Input for creating an owner. A missing `id` is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOwnerParams {
    #[validate(custom(function = "validate_object_id"))]
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub telephone: String,
}

/// Partial owner update. Empty strings leave the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateOwnerParams {
    pub name: String,
    #[validate(custom(function = "validate_email_or_empty"))]
    pub email: String,
    pub telephone: String,
}

impl UpdateOwnerParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.email.is_empty() && self.telephone.is_empty()
    }
}

/// Paging controls shared by the property listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ListParams {
    /// Title order: `1` ascending, `-1` descending, `0` ascending.
    #[validate(range(min = -1, max = 1))]
    pub sort: i64,
    /// `0` first page, `1` records after `pagination_token`, `2` records before it.
    #[validate(range(max = 2))]
    pub search: u8,
    /// Page size. `0` selects the module default.
    pub limit: u64,
    pub pagination_token: String,
}
