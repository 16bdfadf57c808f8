use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::{Document, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDir {
    #[default]
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    /// Numeric order token: `1` (or `0`) ascending, `-1` descending.
    #[must_use]
    pub fn from_order(order: i64) -> Option<Self> {
        match order {
            0 | 1 => Some(SortDir::Asc),
            -1 => Some(SortDir::Desc),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_order(self) -> i64 {
        match self {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        }
    }

    #[must_use]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        }
    }
}

pub type SortSpec = Vec<(String, SortDir)>;

/// Compare two documents field by field according to `spec`. Missing fields sort as null.
#[must_use]
pub fn compare_documents(a: &Document, b: &Document, spec: &[(String, SortDir)]) -> Ordering {
    for (field, dir) in spec {
        let left = a.get_path(field).unwrap_or(&Value::Null);
        let right = b.get_path(field).unwrap_or(&Value::Null);
        let ord = dir.apply(left.cmp_values(right));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Options for a find call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: SortSpec,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub batch_size: Option<usize>,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.sort.push((field.into(), dir));
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexModel {
    pub name: String,
    pub keys: SortSpec,
    pub unique: bool,
}

impl IndexModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
            unique: false,
        }
    }

    #[must_use]
    pub fn key(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.keys.push((field.into(), dir));
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Counts reported by update and replace calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<Value>,
}

impl UpdateResult {
    /// True if anything was matched, modified or upserted.
    #[must_use]
    pub fn touched(&self) -> bool {
        self.matched > 0 || self.modified > 0 || self.upserted_id.is_some()
    }
}

/// Which image a find-and-update call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnDocument {
    Before,
    #[default]
    After,
}
