//! Multi-stage aggregation pipelines.

use crate::filter::Filter;
use crate::options::SortSpec;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOperator {
    /// Tokenised, case-insensitive match on `path`.
    Text { query: String, path: String },
    /// Exact match on `path`.
    Equals { value: Value, path: String },
}

impl SearchOperator {
    #[must_use]
    pub fn to_filter(&self) -> Filter {
        match self {
            Self::Text { query, path } => Filter::text(path.clone(), query.clone()),
            Self::Equals { value, path } => Filter::eq(path.clone(), value.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPage {
    After(String),
    Before(String),
}

/// Search-index stage. Must be the first stage of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStage {
    pub index: String,
    pub operator: SearchOperator,
    pub sort: SortSpec,
    pub page: Option<SearchPage>,
}

/// Metadata a projection can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaField {
    /// Opaque token positioning a record within its search results.
    SearchSequenceToken,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub fields: Vec<String>,
    pub meta: Vec<(String, MetaField)>,
}

impl Projection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    #[must_use]
    pub fn include_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn meta(mut self, field: impl Into<String>, meta: MetaField) -> Self {
        self.meta.push((field.into(), meta));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Search(SearchStage),
    Match(Filter),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
    Project(Projection),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline(Vec<Stage>);

impl Pipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        self.0.push(stage);
        self
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Self(stages)
    }
}
