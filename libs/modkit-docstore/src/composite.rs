//! Combined capability contracts, built by delegation.
//!
//! [`Composite`] forwards each capability to an injected collaborator, so a repository can mix
//! a store-backed [`DocCollection`](crate::DocCollection) with test doubles or decorators one
//! capability at a time.

use std::sync::Arc;

use async_trait::async_trait;
use modkit_errors::AppError;

use crate::context::OpContext;
use crate::filter::{Filter, Update};
use crate::finder::Finder;
use crate::grouper::Grouper;
use crate::inserter::Inserter;
use crate::iterator::RecordIterator;
use crate::pipeline::Pipeline;
use crate::query::{Query, TimeQuery};
use crate::remover::Remover;
use crate::stream::RecordStream;
use crate::updater::Updater;

pub trait FinderInserterUpdaterRemover<T: Send + Sync + 'static>:
    Finder<T> + Inserter<T> + Updater<T> + Remover<T>
{
}

impl<T, S> FinderInserterUpdaterRemover<T> for S
where
    T: Send + Sync + 'static,
    S: Finder<T> + Inserter<T> + Updater<T> + Remover<T>,
{
}

/// Every record-level capability.
pub trait DocumentStore<T: Send + Sync + 'static>:
    FinderInserterUpdaterRemover<T> + Grouper<T>
{
}

impl<T, S> DocumentStore<T> for S
where
    T: Send + Sync + 'static,
    S: FinderInserterUpdaterRemover<T> + Grouper<T>,
{
}

pub struct Composite<T: Send + Sync + 'static> {
    finder: Arc<dyn Finder<T>>,
    inserter: Arc<dyn Inserter<T>>,
    updater: Arc<dyn Updater<T>>,
    remover: Arc<dyn Remover<T>>,
    grouper: Arc<dyn Grouper<T>>,
}

impl<T: Send + Sync + 'static> Clone for Composite<T> {
    fn clone(&self) -> Self {
        Self {
            finder: Arc::clone(&self.finder),
            inserter: Arc::clone(&self.inserter),
            updater: Arc::clone(&self.updater),
            remover: Arc::clone(&self.remover),
            grouper: Arc::clone(&self.grouper),
        }
    }
}

impl<T: Send + Sync + 'static> Composite<T> {
    #[must_use]
    pub fn new(
        finder: Arc<dyn Finder<T>>,
        inserter: Arc<dyn Inserter<T>>,
        updater: Arc<dyn Updater<T>>,
        remover: Arc<dyn Remover<T>>,
        grouper: Arc<dyn Grouper<T>>,
    ) -> Self {
        Self {
            finder,
            inserter,
            updater,
            remover,
            grouper,
        }
    }

    /// Route every capability to `store`.
    #[must_use]
    pub fn from_store<S: DocumentStore<T> + 'static>(store: Arc<S>) -> Self {
        Self {
            finder: Arc::clone(&store) as Arc<dyn Finder<T>>,
            inserter: Arc::clone(&store) as Arc<dyn Inserter<T>>,
            updater: Arc::clone(&store) as Arc<dyn Updater<T>>,
            remover: Arc::clone(&store) as Arc<dyn Remover<T>>,
            grouper: store as Arc<dyn Grouper<T>>,
        }
    }

    /// Replace the finder, keeping the other collaborators.
    #[must_use]
    pub fn with_finder(mut self, finder: Arc<dyn Finder<T>>) -> Self {
        self.finder = finder;
        self
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Finder<T> for Composite<T> {
    fn find(&self, ctx: &OpContext, server: &str, filter: Filter) -> RecordStream<T> {
        self.finder.find(ctx, server, filter)
    }

    fn query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &Query,
    ) -> RecordStream<T> {
        self.finder.query(ctx, server, filter, query)
    }

    fn time_query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &TimeQuery,
    ) -> RecordStream<T> {
        self.finder.time_query(ctx, server, filter, query)
    }

    async fn find_one(&self, ctx: &OpContext, server: &str, filter: Filter) -> Result<T, AppError> {
        self.finder.find_one(ctx, server, filter).await
    }

    async fn find_by_id(&self, ctx: &OpContext, server: &str, id: &str) -> Result<T, AppError> {
        self.finder.find_by_id(ctx, server, id).await
    }

    async fn find_by_ids(
        &self,
        ctx: &OpContext,
        server: &str,
        ids: &[String],
    ) -> Result<Vec<T>, AppError> {
        self.finder.find_by_ids(ctx, server, ids).await
    }

    async fn count(&self, ctx: &OpContext, server: &str, filter: Filter) -> Result<u64, AppError> {
        self.finder.count(ctx, server, filter).await
    }

    async fn document_exists(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<bool, AppError> {
        self.finder.document_exists(ctx, server, id).await
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Inserter<T> for Composite<T> {
    async fn insert_one(
        &self,
        ctx: &OpContext,
        server: &str,
        record: &T,
    ) -> Result<String, AppError> {
        self.inserter.insert_one(ctx, server, record).await
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Updater<T> for Composite<T> {
    async fn update_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<(), AppError> {
        self.updater.update_one(ctx, server, filter, update).await
    }

    async fn update_one_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        update: Update,
    ) -> Result<(), AppError> {
        self.updater.update_one_by_id(ctx, server, id, update).await
    }

    async fn replace_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        record: &T,
    ) -> Result<String, AppError> {
        self.updater.replace_one(ctx, server, filter, record).await
    }

    async fn update_and_find(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<T, AppError> {
        self.updater.update_and_find(ctx, server, filter, update).await
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Remover<T> for Composite<T> {
    async fn delete_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
    ) -> Result<u64, AppError> {
        self.remover.delete_one(ctx, server, filter).await
    }

    async fn delete_one_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<u64, AppError> {
        self.remover.delete_one_by_id(ctx, server, id).await
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> Grouper<T> for Composite<T> {
    async fn aggregate(
        &self,
        ctx: &OpContext,
        server: &str,
        pipeline: Pipeline,
    ) -> Result<RecordIterator<T>, AppError> {
        self.grouper.aggregate(ctx, server, pipeline).await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::collection::DocCollection;
    use crate::memory::MemoryConnector;
    use crate::store::Connector;
    use crate::testing::{Note, NoteFactory, note};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Finder double that answers every point lookup with a fixed note.
    struct StubFinder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Finder<Note> for StubFinder {
        fn find(&self, _: &OpContext, _: &str, _: Filter) -> RecordStream<Note> {
            RecordStream::failed(AppError::internal(anyhow::anyhow!("not stubbed")))
        }

        fn query(&self, _: &OpContext, _: &str, _: Filter, _: &Query) -> RecordStream<Note> {
            RecordStream::failed(AppError::internal(anyhow::anyhow!("not stubbed")))
        }

        fn time_query(&self, _: &OpContext, _: &str, _: Filter, _: &TimeQuery) -> RecordStream<Note> {
            RecordStream::failed(AppError::internal(anyhow::anyhow!("not stubbed")))
        }

        async fn find_one(&self, _: &OpContext, _: &str, _: Filter) -> Result<Note, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(note(0, "stub"))
        }

        async fn find_by_id(&self, ctx: &OpContext, server: &str, _: &str) -> Result<Note, AppError> {
            self.find_one(ctx, server, Filter::All).await
        }

        async fn find_by_ids(&self, _: &OpContext, _: &str, _: &[String]) -> Result<Vec<Note>, AppError> {
            Ok(Vec::new())
        }

        async fn count(&self, _: &OpContext, _: &str, _: Filter) -> Result<u64, AppError> {
            Ok(0)
        }

        async fn document_exists(&self, _: &OpContext, _: &str, _: &str) -> Result<bool, AppError> {
            Ok(true)
        }
    }

    async fn store() -> Arc<DocCollection<NoteFactory>> {
        let conn = Arc::new(MemoryConnector::new("db"));
        conn.create_collection("eu_notes").await.unwrap();
        Arc::new(DocCollection::new(conn, Arc::new(NoteFactory), "_notes"))
    }

    #[tokio::test]
    async fn delegates_every_capability_to_the_store() {
        let composite: Composite<Note> = Composite::from_store(store().await);
        let ctx = OpContext::new();
        let id = composite.insert_one(&ctx, "eu", &note(1, "a")).await.unwrap();
        composite
            .update_one_by_id(&ctx, "eu", &id, Update::new().set("Text", "b"))
            .await
            .unwrap();
        assert_eq!(composite.find_by_id(&ctx, "eu", &id).await.unwrap().text, "b");
        assert_eq!(composite.delete_one_by_id(&ctx, "eu", &id).await.unwrap(), 1);
        assert_eq!(composite.count(&ctx, "eu", Filter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn collaborators_are_swappable_per_capability() {
        let stub = Arc::new(StubFinder {
            calls: AtomicUsize::new(0),
        });
        let composite: Composite<Note> = Composite::from_store(store().await).with_finder(stub.clone());
        let ctx = OpContext::new();

        let id = composite.insert_one(&ctx, "eu", &note(1, "real")).await.unwrap();
        let found = composite.find_by_id(&ctx, "eu", &id).await.unwrap();
        assert_eq!(found.text, "stub");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }
}
