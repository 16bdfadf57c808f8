//! Pipeline execution for the in-memory store, including search-index emulation.
//!
//! Search results are sorted by the stage's sort spec with `_id` as final tiebreaker. Every
//! hit is tagged with a sequence token encoding its sort key, so `After`/`Before` pages are
//! strict keyset windows. `Before` yields the preceding hits nearest-first.

use std::cmp::Ordering;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, TokenError};
use crate::options::{SortDir, SortSpec, compare_documents};
use crate::pipeline::{MetaField, Pipeline, Projection, SearchPage, SearchStage, Stage};
use crate::value::{Document, Value};

const TOKEN_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct SequenceToken {
    v: u8,
    k: Vec<Value>,
}

struct Row {
    doc: Document,
    token: Option<String>,
}

fn encode_token(key: Vec<Value>) -> Result<String, StoreError> {
    let token = SequenceToken {
        v: TOKEN_VERSION,
        k: key,
    };
    let json = serde_json::to_vec(&token).map_err(|_| TokenError::Json)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_token(token: &str, spec: &SortSpec) -> Result<Vec<Value>, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token.as_bytes())
        .map_err(|_| TokenError::Base64)?;
    let token: SequenceToken = serde_json::from_slice(&bytes).map_err(|_| TokenError::Json)?;
    if token.v != TOKEN_VERSION {
        return Err(TokenError::Version(token.v));
    }
    if token.k.len() != spec.len() {
        return Err(TokenError::SortMismatch);
    }
    Ok(token.k)
}

fn sort_key(doc: &Document, spec: &SortSpec) -> Vec<Value> {
    spec.iter()
        .map(|(field, _)| doc.get_path(field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn compare_keys(a: &[Value], b: &[Value], spec: &SortSpec) -> Ordering {
    for ((left, right), (_, dir)) in a.iter().zip(b).zip(spec) {
        let ord = dir.apply(left.cmp_values(right));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn search(docs: &[Document], stage: &SearchStage) -> Result<Vec<Row>, StoreError> {
    let filter = stage.operator.to_filter();
    let mut spec = stage.sort.clone();
    if !spec.iter().any(|(field, _)| field == "_id") {
        spec.push(("_id".to_owned(), SortDir::Asc));
    }

    let mut hits: Vec<&Document> = docs.iter().filter(|d| filter.matches(d)).collect();
    hits.sort_by(|a, b| compare_documents(a, b, &spec));
    let keyed = hits.into_iter().map(|d| (sort_key(d, &spec), d));

    let window: Vec<(Vec<Value>, &Document)> = match &stage.page {
        None => keyed.collect(),
        Some(SearchPage::After(token)) => {
            let anchor = decode_token(token, &spec)?;
            keyed
                .filter(|(key, _)| compare_keys(key, &anchor, &spec) == Ordering::Greater)
                .collect()
        }
        Some(SearchPage::Before(token)) => {
            let anchor = decode_token(token, &spec)?;
            let mut before: Vec<_> = keyed
                .filter(|(key, _)| compare_keys(key, &anchor, &spec) == Ordering::Less)
                .collect();
            before.reverse();
            before
        }
    };

    window
        .into_iter()
        .map(|(key, doc)| {
            Ok(Row {
                doc: doc.clone(),
                token: Some(encode_token(key)?),
            })
        })
        .collect()
}

fn project(row: Row, projection: &Projection) -> Row {
    let mut out = Document::new();
    if let Some(id) = row.doc.get("_id") {
        out.insert("_id", id.clone());
    }
    for field in &projection.fields {
        if let Some(value) = row.doc.get_path(field) {
            out.set_path(field, value.clone());
        }
    }
    for (field, meta) in &projection.meta {
        match meta {
            MetaField::SearchSequenceToken => {
                if let Some(token) = &row.token {
                    out.insert(field.clone(), token.clone());
                }
            }
        }
    }
    Row {
        doc: out,
        token: row.token,
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

pub(super) fn run_pipeline(
    docs: &[Document],
    pipeline: &Pipeline,
) -> Result<Vec<Document>, StoreError> {
    let stages = pipeline.stages();
    let (mut rows, rest) = match stages.split_first() {
        Some((Stage::Search(stage), rest)) => (search(docs, stage)?, rest),
        _ => (
            docs.iter()
                .map(|d| Row {
                    doc: d.clone(),
                    token: None,
                })
                .collect(),
            stages,
        ),
    };

    for stage in rest {
        match stage {
            Stage::Search(_) => {
                return Err(StoreError::InvalidPipeline(
                    "search must be the first stage",
                ));
            }
            Stage::Match(filter) => rows.retain(|r| filter.matches(&r.doc)),
            Stage::Sort(spec) => rows.sort_by(|a, b| compare_documents(&a.doc, &b.doc, spec)),
            Stage::Skip(n) => {
                rows.drain(..to_usize(*n).min(rows.len()));
            }
            Stage::Limit(n) => rows.truncate(to_usize(*n)),
            Stage::Project(projection) => {
                rows = rows.into_iter().map(|r| project(r, projection)).collect();
            }
        }
    }

    Ok(rows.into_iter().map(|r| r.doc).collect())
}
