//! Store-native values and documents.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::oid::ObjectId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    ObjectId(ObjectId),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Cross-type ordering bracket, lowest first.
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Double(_) => 1,
            Self::String(_) => 2,
            Self::Document(_) => 3,
            Self::Array(_) => 4,
            Self::ObjectId(_) => 5,
            Self::Bool(_) => 6,
            Self::DateTime(_) => 7,
        }
    }

    /// True when both values fall in the same ordering bracket.
    #[must_use]
    pub fn comparable(&self, other: &Self) -> bool {
        self.rank() == other.rank()
    }

    /// Total order used for sorting, range filters and keyset comparison.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cmp_values(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Double(b)) => (*a as f64).total_cmp(b),
            (Self::Double(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::ObjectId(a), Self::ObjectId(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) => cmp_seq(a.iter(), b.iter()),
            (Self::Document(a), Self::Document(b)) => cmp_seq(a.0.values(), b.0.values()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

fn cmp_seq<'a>(
    a: impl Iterator<Item = &'a Value>,
    b: impl Iterator<Item = &'a Value>,
) -> Ordering {
    let mut b = b;
    for left in a {
        let Some(right) = b.next() else {
            return Ordering::Greater;
        };
        let ord = left.cmp_values(right);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    if b.next().is_some() {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::ObjectId(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Document(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

/// An ordered map of field names to values. Dotted paths address nested documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(BTreeMap<String, Value>);

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Resolve a dotted path such as `Metadata.CreatedAt`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.0.get(first)?;
        for part in parts {
            match current {
                Value::Document(doc) => current = doc.0.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Set a dotted path, creating intermediate documents as needed.
    pub fn set_path(&mut self, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                self.0.insert(path.to_owned(), value);
            }
            Some((head, rest)) => {
                let entry = self
                    .0
                    .entry(head.to_owned())
                    .or_insert_with(|| Value::Document(Self::new()));
                if !matches!(entry, Value::Document(_)) {
                    *entry = Value::Document(Self::new());
                }
                if let Value::Document(inner) = entry {
                    inner.set_path(rest, value);
                }
            }
        }
    }

    pub fn remove_path(&mut self, path: &str) -> Option<Value> {
        match path.split_once('.') {
            None => self.0.remove(path),
            Some((head, rest)) => match self.0.get_mut(head) {
                Some(Value::Document(inner)) => inner.remove_path(rest),
                _ => None,
            },
        }
    }

    fn require(&self, path: &str) -> Result<&Value, DecodeError> {
        self.get_path(path)
            .ok_or_else(|| DecodeError::MissingField(path.to_owned()))
    }

    fn wrong_type(path: &str, expected: &'static str) -> DecodeError {
        DecodeError::WrongType {
            field: path.to_owned(),
            expected,
        }
    }

    /// # Errors
    /// Returns [`DecodeError`] when the field is absent or not a string.
    pub fn get_str(&self, path: &str) -> Result<&str, DecodeError> {
        match self.require(path)? {
            Value::String(s) => Ok(s),
            _ => Err(Self::wrong_type(path, "string")),
        }
    }

    /// Like [`Document::get_str`] but yields an empty string when the field is absent.
    ///
    /// # Errors
    /// Returns [`DecodeError`] when the field is present with another type.
    pub fn get_str_or_empty(&self, path: &str) -> Result<&str, DecodeError> {
        match self.get_path(path) {
            None | Some(Value::Null) => Ok(""),
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(Self::wrong_type(path, "string")),
        }
    }

    /// # Errors
    /// Returns [`DecodeError`] when the field is absent or not a boolean.
    pub fn get_bool(&self, path: &str) -> Result<bool, DecodeError> {
        match self.require(path)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(Self::wrong_type(path, "boolean")),
        }
    }

    /// # Errors
    /// Returns [`DecodeError`] when the field is absent or not an integer.
    pub fn get_i64(&self, path: &str) -> Result<i64, DecodeError> {
        match self.require(path)? {
            Value::Int(i) => Ok(*i),
            _ => Err(Self::wrong_type(path, "integer")),
        }
    }

    /// # Errors
    /// Returns [`DecodeError`] when the field is absent or not a timestamp.
    pub fn get_datetime(&self, path: &str) -> Result<DateTime<Utc>, DecodeError> {
        match self.require(path)? {
            Value::DateTime(dt) => Ok(*dt),
            _ => Err(Self::wrong_type(path, "datetime")),
        }
    }

    /// # Errors
    /// Returns [`DecodeError`] when the field is absent or not an object id.
    pub fn get_object_id(&self, path: &str) -> Result<ObjectId, DecodeError> {
        match self.require(path)? {
            Value::ObjectId(id) => Ok(*id),
            _ => Err(Self::wrong_type(path, "object id")),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Build a [`Document`] from `key => value` pairs.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::value::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::value::Document::new();
        $( doc.insert($key, $value); )+
        doc
    }};
}
