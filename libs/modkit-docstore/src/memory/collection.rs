use std::cmp::Ordering as CmpOrdering;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::aggregate::run_pipeline;
use crate::error::StoreError;
use crate::filter::{Filter, Update};
use crate::oid::ObjectId;
use crate::options::{
    FindOptions, IndexModel, ReturnDocument, SortDir, UpdateResult, compare_documents,
};
use crate::pipeline::Pipeline;
use crate::store::{Collection, DocCursor};
use crate::value::{Document, Value};

const ID_INDEX: &str = "_id_";

#[derive(Default)]
struct State {
    docs: Vec<Document>,
    indexes: Vec<IndexModel>,
}

pub struct MemoryCollection {
    name: String,
    state: RwLock<State>,
    online: Arc<AtomicBool>,
    batch_size: usize,
}

impl MemoryCollection {
    pub(super) fn new(name: &str, online: Arc<AtomicBool>, batch_size: usize) -> Self {
        let id_index = IndexModel::new(ID_INDEX).key("_id", SortDir::Asc).unique();
        Self {
            name: name.to_owned(),
            state: RwLock::new(State {
                docs: Vec::new(),
                indexes: vec![id_index],
            }),
            online,
            batch_size,
        }
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!(
                "collection '{}' is unreachable",
                self.name
            )))
        }
    }

    fn cursor(&self, docs: Vec<Document>, batch_size: Option<usize>) -> Box<dyn DocCursor> {
        Box::new(MemoryCursor {
            pending: docs.into(),
            batch_size: batch_size.unwrap_or(self.batch_size).max(1),
            online: Arc::clone(&self.online),
            closed: false,
        })
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

fn select(docs: &[Document], filter: &Filter, options: &FindOptions) -> Vec<Document> {
    let mut hits: Vec<Document> = docs.iter().filter(|d| filter.matches(d)).cloned().collect();
    if !options.sort.is_empty() {
        hits.sort_by(|a, b| compare_documents(a, b, &options.sort));
    }
    let skip = options.skip.map_or(0, to_usize);
    let limit = match options.limit {
        Some(0) | None => usize::MAX,
        Some(n) => to_usize(n),
    };
    hits.into_iter().skip(skip).take(limit).collect()
}

fn index_key(doc: &Document, index: &IndexModel) -> Vec<Value> {
    index
        .keys
        .iter()
        .map(|(field, _)| doc.get_path(field).cloned().unwrap_or(Value::Null))
        .collect()
}

fn same_key(a: &[Value], b: &[Value]) -> bool {
    a.iter()
        .zip(b)
        .all(|(x, y)| x.cmp_values(y) == CmpOrdering::Equal)
}

/// Reject `doc` if it collides with another document on a unique index.
fn check_unique(state: &State, doc: &Document, ignore: Option<usize>) -> Result<(), StoreError> {
    for index in state.indexes.iter().filter(|i| i.unique) {
        let key = index_key(doc, index);
        let clash = state
            .docs
            .iter()
            .enumerate()
            .filter(|(pos, _)| Some(*pos) != ignore)
            .any(|(_, other)| same_key(&key, &index_key(other, index)));
        if clash {
            return Err(StoreError::DuplicateKey {
                index: index.name.clone(),
            });
        }
    }
    Ok(())
}

fn ensure_id(doc: &mut Document) -> Value {
    if let Some(id) = doc.get("_id") {
        return id.clone();
    }
    let id = Value::ObjectId(ObjectId::new());
    doc.insert("_id", id.clone());
    id
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Box<dyn DocCursor>, StoreError> {
        self.check_online()?;
        let hits = select(&self.state.read().docs, filter, options);
        Ok(self.cursor(hits, options.batch_size))
    }

    async fn find_one(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        let options = options.clone().limit(1);
        Ok(select(&self.state.read().docs, filter, &options)
            .into_iter()
            .next())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.check_online()?;
        let n = self
            .state
            .read()
            .docs
            .iter()
            .filter(|d| filter.matches(d))
            .count();
        Ok(u64::try_from(n).unwrap_or(u64::MAX))
    }

    async fn insert_one(&self, mut doc: Document) -> Result<Value, StoreError> {
        self.check_online()?;
        let id = ensure_id(&mut doc);
        let mut state = self.state.write();
        check_unique(&state, &doc, None)?;
        state.docs.push(doc);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        self.check_online()?;
        let mut state = self.state.write();
        if let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) {
            let mut candidate = state.docs[pos].clone();
            let changed = update.apply(&mut candidate);
            if changed {
                check_unique(&state, &candidate, Some(pos))?;
                state.docs[pos] = candidate;
            }
            return Ok(UpdateResult {
                matched: 1,
                modified: u64::from(changed),
                upserted_id: None,
            });
        }
        if !upsert {
            return Ok(UpdateResult::default());
        }
        let mut doc: Document = filter
            .equalities()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.clone()))
            .collect();
        update.apply(&mut doc);
        let id = ensure_id(&mut doc);
        check_unique(&state, &doc, None)?;
        state.docs.push(doc);
        Ok(UpdateResult {
            matched: 0,
            modified: 0,
            upserted_id: Some(id),
        })
    }

    async fn replace_one(
        &self,
        filter: &Filter,
        mut replacement: Document,
        upsert: bool,
    ) -> Result<UpdateResult, StoreError> {
        self.check_online()?;
        let mut state = self.state.write();
        if let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) {
            if let Some(id) = state.docs[pos].get("_id").cloned() {
                replacement.insert("_id", id);
            }
            let changed = state.docs[pos] != replacement;
            if changed {
                check_unique(&state, &replacement, Some(pos))?;
                state.docs[pos] = replacement;
            }
            return Ok(UpdateResult {
                matched: 1,
                modified: u64::from(changed),
                upserted_id: None,
            });
        }
        if !upsert {
            return Ok(UpdateResult::default());
        }
        let id = ensure_id(&mut replacement);
        check_unique(&state, &replacement, None)?;
        state.docs.push(replacement);
        Ok(UpdateResult {
            matched: 0,
            modified: 0,
            upserted_id: Some(id),
        })
    }

    async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &Update,
        ret: ReturnDocument,
    ) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        let mut state = self.state.write();
        let Some(pos) = state.docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };
        let before = state.docs[pos].clone();
        let mut after = before.clone();
        if update.apply(&mut after) {
            check_unique(&state, &after, Some(pos))?;
            state.docs[pos] = after.clone();
        }
        Ok(Some(match ret {
            ReturnDocument::Before => before,
            ReturnDocument::After => after,
        }))
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.check_online()?;
        let mut state = self.state.write();
        match state.docs.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                state.docs.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Box<dyn DocCursor>, StoreError> {
        self.check_online()?;
        let rows = run_pipeline(&self.state.read().docs, pipeline)?;
        Ok(self.cursor(rows, None))
    }

    async fn create_index(&self, index: IndexModel) -> Result<String, StoreError> {
        self.check_online()?;
        let mut state = self.state.write();
        if let Some(existing) = state.indexes.iter().find(|i| i.name == index.name) {
            return Ok(existing.name.clone());
        }
        if index.unique {
            let keys: Vec<_> = state.docs.iter().map(|d| index_key(d, &index)).collect();
            for (i, key) in keys.iter().enumerate() {
                if keys[i + 1..].iter().any(|other| same_key(key, other)) {
                    return Err(StoreError::DuplicateKey {
                        index: index.name.clone(),
                    });
                }
            }
        }
        let name = index.name.clone();
        state.indexes.push(index);
        Ok(name)
    }
}

pub struct MemoryCursor {
    pending: VecDeque<Document>,
    batch_size: usize,
    online: Arc<AtomicBool>,
    closed: bool,
}

#[async_trait]
impl DocCursor for MemoryCursor {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>, StoreError> {
        if self.closed {
            return Ok(None);
        }
        if !self.online.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("cursor lost its connection".to_owned()));
        }
        if self.pending.is_empty() {
            self.close();
            return Ok(None);
        }
        let n = self.batch_size.min(self.pending.len());
        Ok(Some(self.pending.drain(..n).collect()))
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::doc;

    fn collection() -> MemoryCollection {
        MemoryCollection::new("eu_properties", Arc::new(AtomicBool::new(true)), 2)
    }

    async fn drain(mut cursor: Box<dyn DocCursor>) -> Vec<Document> {
        let mut out = Vec::new();
        while let Some(batch) = cursor.next_batch().await.unwrap() {
            out.extend(batch);
        }
        out
    }

    #[tokio::test]
    async fn find_sorts_skips_limits_and_batches() {
        let c = collection();
        for n in [3i64, 1, 4, 1, 5] {
            c.insert_one(doc! { "n" => n }).await.unwrap();
        }
        let opts = FindOptions::new().sort_by("n", SortDir::Desc).skip(1).limit(3);
        let mut cursor = c.find(&Filter::All, &opts).await.unwrap();
        assert_eq!(cursor.next_batch().await.unwrap().unwrap().len(), 2);
        assert_eq!(cursor.next_batch().await.unwrap().unwrap().len(), 1);
        assert!(cursor.next_batch().await.unwrap().is_none());

        let values: Vec<_> = drain(c.find(&Filter::All, &opts).await.unwrap())
            .await
            .iter()
            .map(|d| d.get_i64("n").unwrap())
            .collect();
        assert_eq!(values, vec![4, 3, 1]);
    }

    #[tokio::test]
    async fn zero_limit_means_unbounded() {
        let c = collection();
        for n in 0..5i64 {
            c.insert_one(doc! { "n" => n }).await.unwrap();
        }
        let all = drain(
            c.find(&Filter::All, &FindOptions::new().limit(0))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn duplicate_ids_and_unique_indexes_are_rejected() {
        let c = collection();
        let id = ObjectId::new();
        c.insert_one(doc! { "_id" => id, "Email" => "a@b.c" })
            .await
            .unwrap();
        assert!(matches!(
            c.insert_one(doc! { "_id" => id }).await,
            Err(StoreError::DuplicateKey { index }) if index == ID_INDEX
        ));

        c.create_index(IndexModel::new("email").key("Email", SortDir::Asc).unique())
            .await
            .unwrap();
        assert!(matches!(
            c.insert_one(doc! { "Email" => "a@b.c" }).await,
            Err(StoreError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn update_counts_matched_modified_and_upserted() {
        let c = collection();
        c.insert_one(doc! { "k" => "a", "v" => 1i64 }).await.unwrap();

        let same = c
            .update_one(&Filter::eq("k", "a"), &Update::new().set("v", 1i64), false)
            .await
            .unwrap();
        assert_eq!((same.matched, same.modified), (1, 0));

        let miss = c
            .update_one(&Filter::eq("k", "z"), &Update::new().set("v", 2i64), false)
            .await
            .unwrap();
        assert!(!miss.touched());

        let up = c
            .update_one(&Filter::eq("k", "z"), &Update::new().set("v", 2i64), true)
            .await
            .unwrap();
        assert!(up.upserted_id.is_some());
        assert_eq!(c.count(&Filter::eq("k", "z")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replace_keeps_the_existing_identifier() {
        let c = collection();
        let id = c.insert_one(doc! { "v" => 1i64 }).await.unwrap();
        let res = c
            .replace_one(&Filter::eq("_id", id.clone()), doc! { "v" => 2i64 }, false)
            .await
            .unwrap();
        assert_eq!(res.modified, 1);
        let stored = c
            .find_one(&Filter::eq("_id", id), &FindOptions::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.get_i64("v"), Ok(2));
    }

    #[tokio::test]
    async fn find_one_and_update_returns_requested_image() {
        let c = collection();
        c.insert_one(doc! { "v" => 1i64 }).await.unwrap();
        let before = c
            .find_one_and_update(
                &Filter::All,
                &Update::new().set("v", 2i64),
                ReturnDocument::Before,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.get_i64("v"), Ok(1));
        let after = c
            .find_one_and_update(
                &Filter::All,
                &Update::new().set("v", 3i64),
                ReturnDocument::After,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.get_i64("v"), Ok(3));
    }

    #[tokio::test]
    async fn delete_reports_zero_when_nothing_matched() {
        let c = collection();
        c.insert_one(doc! { "v" => 1i64 }).await.unwrap();
        assert_eq!(c.delete_one(&Filter::eq("v", 1i64)).await.unwrap(), 1);
        assert_eq!(c.delete_one(&Filter::eq("v", 1i64)).await.unwrap(), 0);
    }
}
