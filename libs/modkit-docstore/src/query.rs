//! Query descriptors for bounded retrievals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::oid::ObjectId;
use crate::options::SortDir;

pub const MAX_LIMIT: u64 = 10_000;

/// Field that keyset cursors scan on.
pub const KEYSET_FIELD: &str = "_id";

fn validate_object_id(value: &str) -> Result<(), ValidationError> {
    ObjectId::parse_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("object_id"))
}

fn validate_query(query: &Query) -> Result<(), ValidationError> {
    let custom_sort = query
        .sort
        .as_deref()
        .is_some_and(|field| field != KEYSET_FIELD);
    let usable_cursor = query
        .cursor
        .as_deref()
        .is_some_and(|c| ObjectId::parse_str(c).is_ok());
    if usable_cursor && custom_sort {
        return Err(ValidationError::new("cursor_requires_id_sort"));
    }
    Ok(())
}

/// Equality query descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_query"))]
#[serde(default)]
pub struct Query {
    #[validate(custom(function = "validate_object_id"))]
    pub id: Option<String>,

    #[validate(length(min = 1))]
    pub server: String,

    /// Identifier of the last record of the previous page. Not validated: a malformed cursor
    /// restarts pagination from the first page.
    pub cursor: Option<String>,

    /// Field to order by; `_id` when absent.
    #[validate(length(min = 1))]
    pub sort: Option<String>,

    /// `1` ascending, `-1` descending, `0` ascending.
    #[validate(range(min = -1, max = 1))]
    pub order: i64,

    /// Honoured only on the first page.
    pub skip: u64,

    /// `0` means unbounded.
    #[validate(range(max = 10_000))]
    pub limit: u64,
}

impl Query {
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_order(mut self, dir: SortDir) -> Self {
        self.order = dir.as_order();
        self
    }

    #[must_use]
    pub fn with_skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn direction(&self) -> SortDir {
        SortDir::from_order(self.order).unwrap_or_default()
    }

    #[must_use]
    pub fn sort_field(&self) -> &str {
        self.sort.as_deref().unwrap_or(KEYSET_FIELD)
    }
}

fn validate_time_window(query: &TimeQuery) -> Result<(), ValidationError> {
    match (query.start_date, query.end_date) {
        (Some(start), Some(end)) if start > end => Err(ValidationError::new("start_after_end")),
        _ => Ok(()),
    }
}

/// Time-range query descriptor. Dates are whole days, both ends inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_time_window"))]
pub struct TimeQuery {
    #[serde(flatten)]
    #[validate(nested)]
    pub query: Query,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TimeQuery {
    #[must_use]
    pub fn new(query: Query) -> Self {
        Self {
            query,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }
}
