//! Pull-based iteration over a store cursor, mapping each raw record through a decoder.

use std::collections::VecDeque;
use std::sync::Arc;

use modkit_errors::AppError;
use tracing::warn;

use crate::context::OpContext;
use crate::factory::RecordDecoder;
use crate::store::DocCursor;
use crate::value::Document;

/// Outcome of a single advancement.
pub(crate) enum Step<T> {
    Record(T),
    /// One record failed to decode or map; iteration may continue.
    Skipped(AppError),
    /// The cursor itself failed; iteration is over.
    Failed(AppError),
    Done,
}

pub struct RecordIterator<T> {
    cursor: Option<Box<dyn DocCursor>>,
    buffer: VecDeque<Document>,
    decoder: Arc<dyn RecordDecoder<T>>,
}

impl<T> RecordIterator<T> {
    #[must_use]
    pub fn new(cursor: Box<dyn DocCursor>, decoder: Arc<dyn RecordDecoder<T>>) -> Self {
        Self {
            cursor: Some(cursor),
            buffer: VecDeque::new(),
            decoder,
        }
    }

    /// True once the cursor is exhausted, failed or closed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none() && self.buffer.is_empty()
    }

    /// Pull the next store batch into the buffer. Returns `Ok(false)` when nothing is left.
    async fn fill(&mut self, ctx: &OpContext) -> Result<bool, AppError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(false);
        };
        match ctx.run(cursor.next_batch()).await {
            Ok(Some(batch)) => {
                self.buffer.extend(batch);
                Ok(true)
            }
            Ok(None) => {
                self.close();
                Ok(false)
            }
            Err(err) => {
                self.close();
                Err(err.into())
            }
        }
    }

    pub(crate) async fn step(&mut self, ctx: &OpContext) -> Step<T> {
        while self.buffer.is_empty() {
            match self.fill(ctx).await {
                Ok(true) => {}
                Ok(false) => return Step::Done,
                Err(err) => return Step::Failed(err),
            }
        }
        let Some(doc) = self.buffer.pop_front() else {
            return Step::Done;
        };
        match self.decoder.decode(&doc) {
            Ok(record) => Step::Record(record),
            Err(err) => {
                warn!(error = %err, "skipping record that failed to decode");
                Step::Skipped(err)
            }
        }
    }

    /// Materialise every remaining record. Fails as a whole if any record fails to map.
    ///
    /// # Errors
    /// The first decode, mapping or cursor failure.
    pub async fn get_all(&mut self, ctx: &OpContext) -> Result<Vec<T>, AppError> {
        let mut out = Vec::new();
        loop {
            match self.step(ctx).await {
                Step::Record(record) => out.push(record),
                Step::Skipped(err) | Step::Failed(err) => {
                    self.close();
                    return Err(err);
                }
                Step::Done => return Ok(out),
            }
        }
    }

    /// Advance one record. `Ok(None)` means exhausted; the iterator is inert from then on.
    /// A per-record failure is returned as `Err` and the next call continues after it.
    ///
    /// # Errors
    /// Decode, mapping or cursor failures.
    pub async fn get_next(&mut self, ctx: &OpContext) -> Result<Option<T>, AppError> {
        match self.step(ctx).await {
            Step::Record(record) => Ok(Some(record)),
            Step::Skipped(err) | Step::Failed(err) => Err(err),
            Step::Done => Ok(None),
        }
    }

    /// Map one store batch (or whatever is still buffered). `Ok(None)` once exhausted.
    ///
    /// # Errors
    /// Cursor failures; per-record failures are returned inside the batch.
    pub async fn get_next_batch(
        &mut self,
        ctx: &OpContext,
    ) -> Result<Option<Vec<Result<T, AppError>>>, AppError> {
        if self.buffer.is_empty() && !self.fill(ctx).await? {
            return Ok(None);
        }
        let batch = self
            .buffer
            .drain(..)
            .map(|doc| self.decoder.decode(&doc))
            .collect();
        Ok(Some(batch))
    }

    /// Release the cursor and drop anything buffered.
    pub fn close(&mut self) {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
        self.buffer.clear();
    }
}

impl<T> Drop for RecordIterator<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::Filter;
    use crate::memory::MemoryConnector;
    use crate::options::FindOptions;
    use crate::store::{Collection, Connector};
    use crate::testing::{NoteFactory, note_doc};
    use modkit_errors::ErrorKind;

    async fn iterator(docs: Vec<Document>) -> (MemoryConnector, RecordIterator<crate::testing::Note>) {
        let conn = MemoryConnector::new("db").with_batch_size(2);
        let coll = conn.create_collection("notes").await.unwrap();
        for d in docs {
            coll.insert_one(d).await.unwrap();
        }
        let opts = FindOptions::new().sort_by("Seq", crate::options::SortDir::Asc);
        let cursor = coll.find(&Filter::All, &opts).await.unwrap();
        (conn, RecordIterator::new(cursor, Arc::new(NoteFactory)))
    }

    #[tokio::test]
    async fn get_next_is_fused_after_exhaustion() {
        let ctx = OpContext::new();
        let (_conn, mut it) = iterator(vec![note_doc(1, "a"), note_doc(2, "b")]).await;
        assert_eq!(it.get_next(&ctx).await.unwrap().unwrap().seq, 1);
        assert_eq!(it.get_next(&ctx).await.unwrap().unwrap().seq, 2);
        assert!(it.get_next(&ctx).await.unwrap().is_none());
        assert!(it.is_exhausted());
        assert!(it.get_next(&ctx).await.unwrap().is_none());
        assert!(it.get_next_batch(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_next_continues_past_a_bad_record() {
        let ctx = OpContext::new();
        let bad = doc! { "Seq" => 2i64 };
        let (_conn, mut it) = iterator(vec![note_doc(1, "a"), bad, note_doc(3, "c")]).await;
        assert!(it.get_next(&ctx).await.unwrap().is_some());
        let err = it.get_next(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(it.get_next(&ctx).await.unwrap().unwrap().seq, 3);
    }

    #[tokio::test]
    async fn get_all_fails_atomically() {
        let ctx = OpContext::new();
        let (_conn, mut ok) = iterator(vec![note_doc(1, "a"), note_doc(2, "b"), note_doc(3, "c")]).await;
        assert_eq!(ok.get_all(&ctx).await.unwrap().len(), 3);

        let bad = doc! { "Seq" => 2i64 };
        let (_conn, mut broken) = iterator(vec![note_doc(1, "a"), bad]).await;
        assert!(broken.get_all(&ctx).await.is_err());
        assert!(broken.is_exhausted());
    }

    #[tokio::test]
    async fn batches_follow_store_batches() {
        let ctx = OpContext::new();
        let docs = (1..=5).map(|i| note_doc(i, "x")).collect();
        let (_conn, mut it) = iterator(docs).await;
        let mut sizes = Vec::new();
        while let Some(batch) = it.get_next_batch(&ctx).await.unwrap() {
            sizes.push(batch.len());
        }
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn cursor_failure_ends_iteration() {
        let ctx = OpContext::new();
        let docs = (1..=4).map(|i| note_doc(i, "x")).collect();
        let (conn, mut it) = iterator(docs).await;
        assert!(it.get_next(&ctx).await.unwrap().is_some());
        assert!(it.get_next(&ctx).await.unwrap().is_some());
        conn.set_online(false);
        let err = it.get_next(&ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Database);
        assert!(it.is_exhausted());
        assert!(it.get_next(&ctx).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn close_makes_the_iterator_inert() {
        let ctx = OpContext::new();
        let (_conn, mut it) = iterator(vec![note_doc(1, "a")]).await;
        it.close();
        assert!(it.get_next(&ctx).await.unwrap().is_none());
    }
}
