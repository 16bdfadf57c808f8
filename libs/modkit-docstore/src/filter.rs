//! Filter expressions and partial updates.

use std::cmp::Ordering;

use crate::value::{Document, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A predicate over documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Exists {
        field: String,
        exists: bool,
    },
    /// Case-insensitive term match: any query term equals any word of the field.
    Text {
        path: String,
        query: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn is_in(field: impl Into<String>, values: impl IntoIterator<Item = Value>) -> Self {
        Self::In {
            field: field.into(),
            values: values.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn text(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Text {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Conjunction, flattening nested `And`s and dropping `All`.
    #[must_use]
    pub fn and(self, other: Filter) -> Filter {
        let mut parts = Vec::new();
        for f in [self, other] {
            match f {
                Filter::All => {}
                Filter::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::All,
            1 => parts.pop().unwrap_or_default(),
            _ => Filter::And(parts),
        }
    }

    #[must_use]
    pub fn and_maybe(self, other: Option<Filter>) -> Filter {
        match other {
            Some(f) => self.and(f),
            None => self,
        }
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Compare { field, op, value } => compare(doc.get_path(field), *op, value),
            Filter::In { field, values } => {
                let actual = doc.get_path(field).unwrap_or(&Value::Null);
                values
                    .iter()
                    .any(|v| actual.cmp_values(v) == Ordering::Equal)
            }
            Filter::Exists { field, exists } => doc.get_path(field).is_some() == *exists,
            Filter::Text { path, query } => text_matches(doc.get_path(path), query),
            Filter::And(parts) => parts.iter().all(|f| f.matches(doc)),
            Filter::Or(parts) => parts.iter().any(|f| f.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
        }
    }

    /// Top-level equality constraints, used to seed upserted documents.
    #[must_use]
    pub fn equalities(&self) -> Vec<(&str, &Value)> {
        match self {
            Filter::Compare {
                field,
                op: CompareOp::Eq,
                value,
            } => vec![(field.as_str(), value)],
            Filter::And(parts) => parts.iter().flat_map(Filter::equalities).collect(),
            _ => Vec::new(),
        }
    }
}

fn compare(actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    let actual = actual.unwrap_or(&Value::Null);
    match op {
        CompareOp::Eq => actual.cmp_values(expected) == Ordering::Equal,
        CompareOp::Ne => actual.cmp_values(expected) != Ordering::Equal,
        // Range operators only compare within the same type bracket.
        _ if !actual.comparable(expected) => false,
        CompareOp::Gt => actual.cmp_values(expected) == Ordering::Greater,
        CompareOp::Gte => actual.cmp_values(expected) != Ordering::Less,
        CompareOp::Lt => actual.cmp_values(expected) == Ordering::Less,
        CompareOp::Lte => actual.cmp_values(expected) != Ordering::Greater,
    }
}

fn text_matches(actual: Option<&Value>, query: &str) -> bool {
    let Some(text) = actual.and_then(Value::as_str) else {
        return false;
    };
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .any(|term| words.contains(&term))
}

/// A partial update: fields to set and fields to remove.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Vec<(String, Value)>,
    unset: Vec<String>,
}

impl Update {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.push(field.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    pub fn sets(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.set.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Apply to `doc`; returns whether anything changed.
    #[must_use]
    pub fn apply(&self, doc: &mut Document) -> bool {
        let before = doc.clone();
        for (field, value) in &self.set {
            doc.set_path(field, value.clone());
        }
        for field in &self.unset {
            doc.remove_path(field);
        }
        *doc != before
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::doc;

    fn house() -> Document {
        doc! {
            "Category" => "House",
            "Title" => "Red brick villa",
            "SaleType" => 2i64,
            "Metadata" => doc! { "UpdatedAt" => 0i64 },
        }
    }

    #[test]
    fn comparisons_respect_type_brackets() {
        let d = house();
        assert!(Filter::gt("SaleType", 1i64).matches(&d));
        assert!(!Filter::gt("SaleType", "1").matches(&d));
        assert!(Filter::ne("SaleType", "2").matches(&d));
        assert!(Filter::eq("Metadata.UpdatedAt", 0i64).matches(&d));
    }

    #[test]
    fn missing_fields_equal_null() {
        let d = house();
        assert!(Filter::eq("Address", Value::Null).matches(&d));
        assert!(!Filter::lt("Address", 5i64).matches(&d));
    }

    #[test]
    fn text_search_matches_whole_words_case_insensitively() {
        let d = house();
        assert!(Filter::text("Category", "house").matches(&d));
        assert!(Filter::text("Title", "BRICK cottage").matches(&d));
        assert!(!Filter::text("Title", "bri").matches(&d));
    }

    #[test]
    fn and_flattens_and_drops_all() {
        let f = Filter::All
            .and(Filter::eq("a", 1i64))
            .and(Filter::eq("b", 2i64).and(Filter::eq("c", 3i64)));
        match &f {
            Filter::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("unexpected filter {other:?}"),
        }
        assert_eq!(f.equalities().len(), 3);
        assert_eq!(Filter::All.and(Filter::All), Filter::All);
    }

    #[test]
    fn update_reports_whether_the_document_changed() {
        let mut d = house();
        assert!(!Update::new().set("Category", "House").apply(&mut d));
        assert!(
            Update::new()
                .set("Title", "Villa")
                .unset("SaleType")
                .apply(&mut d)
        );
        assert_eq!(d.get_str("Title"), Ok("Villa"));
        assert!(!d.contains_key("SaleType"));
    }
}
