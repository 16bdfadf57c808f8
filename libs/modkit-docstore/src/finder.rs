//! Read-side capability: streaming finds, point lookups and counts.

use std::sync::Arc;

use async_trait::async_trait;
use modkit_errors::{AppError, ErrorKind};
use tracing::{debug, warn};
use validator::Validate;

use crate::collection::{DocCollection, parse_object_id};
use crate::context::OpContext;
use crate::factory::{Factory, RecordDecoder};
use crate::filter::Filter;
use crate::helper::QueryHelper;
use crate::iterator::{RecordIterator, Step};
use crate::options::{FindOptions, SortDir};
use crate::query::{KEYSET_FIELD, Query, TimeQuery};
use crate::stream::{Completion, RecordStream, StreamSink};
use crate::value::Value;

#[async_trait]
pub trait Finder<T: Send + Sync + 'static>: Send + Sync {
    /// Stream every record of `server` matching `filter`, in `_id` order.
    fn find(&self, ctx: &OpContext, server: &str, filter: Filter) -> RecordStream<T>;

    /// Stream one page described by `query`. An invalid descriptor yields a stream carrying a
    /// single invalid-argument error.
    fn query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &Query,
    ) -> RecordStream<T>;

    /// Like [`Finder::query`], further bounded by the descriptor's creation-date window.
    fn time_query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &TimeQuery,
    ) -> RecordStream<T>;

    /// # Errors
    /// `NotFound` when nothing matches.
    async fn find_one(&self, ctx: &OpContext, server: &str, filter: Filter) -> Result<T, AppError>;

    /// # Errors
    /// `InvalidArgument` for a malformed id, `NotFound` when absent.
    async fn find_by_id(&self, ctx: &OpContext, server: &str, id: &str) -> Result<T, AppError>;

    /// Records for whichever of `ids` exist, in `_id` order.
    ///
    /// # Errors
    /// `InvalidArgument` for any malformed id; any decode failure fails the whole call.
    async fn find_by_ids(
        &self,
        ctx: &OpContext,
        server: &str,
        ids: &[String],
    ) -> Result<Vec<T>, AppError>;

    /// # Errors
    /// Store failures.
    async fn count(&self, ctx: &OpContext, server: &str, filter: Filter) -> Result<u64, AppError>;

    /// # Errors
    /// `InvalidArgument` for a malformed id, or store failures.
    async fn document_exists(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<bool, AppError>;
}

impl<F: Factory> DocCollection<F> {
    fn decoder(&self) -> Arc<dyn RecordDecoder<F::Domain>> {
        Arc::clone(&self.factory) as Arc<dyn RecordDecoder<F::Domain>>
    }

    pub(crate) fn stream(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        options: FindOptions,
    ) -> RecordStream<F::Domain> {
        let this = self.clone();
        let server = server.to_owned();
        RecordStream::spawn(ctx, move |sink| async move {
            this.produce(&server, &filter, &options, &sink).await
        })
    }

    async fn produce(
        &self,
        server: &str,
        filter: &Filter,
        options: &FindOptions,
        sink: &StreamSink<F::Domain>,
    ) -> Completion {
        let ctx = sink.context();
        let collection = match self.resolve(server) {
            Ok(collection) => collection,
            Err(err) => {
                sink.error(err).await;
                return Completion::Aborted;
            }
        };
        let cursor = match ctx.run(collection.find(filter, options)).await {
            Ok(cursor) => cursor,
            Err(_) if sink.is_cancelled() => return Completion::Cancelled,
            Err(err) => {
                warn!(collection = collection.name(), error = %err, "find failed");
                sink.error(err.into()).await;
                return Completion::Aborted;
            }
        };

        let mut records = RecordIterator::new(cursor, self.decoder());
        loop {
            let step = tokio::select! {
                biased;
                () = sink.cancelled() => return Completion::Cancelled,
                step = records.step(&ctx) => step,
            };
            match step {
                Step::Record(record) => {
                    if !sink.record(record).await {
                        return Completion::Cancelled;
                    }
                }
                Step::Skipped(err) => {
                    if !sink.error(err).await {
                        return Completion::Cancelled;
                    }
                }
                Step::Failed(err) => {
                    if sink.is_cancelled() {
                        return Completion::Cancelled;
                    }
                    warn!(collection = collection.name(), error = %err, "cursor failed");
                    sink.error(err).await;
                    return Completion::Aborted;
                }
                Step::Done => {
                    debug!(collection = collection.name(), "stream exhausted");
                    return Completion::Exhausted;
                }
            }
        }
    }

    async fn fetch_all(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<F::Domain>, AppError> {
        let collection = self.resolve(server)?;
        let cursor = ctx.run(collection.find(filter, options)).await?;
        RecordIterator::new(cursor, self.decoder()).get_all(ctx).await
    }
}

fn id_order() -> FindOptions {
    QueryHelper::build_options(0, SortDir::Asc, 0, KEYSET_FIELD, false)
}

fn id_filter(id: &str) -> Result<Filter, AppError> {
    Ok(Filter::eq(KEYSET_FIELD, parse_object_id(id)?))
}

#[async_trait]
impl<F: Factory> Finder<F::Domain> for DocCollection<F> {
    fn find(&self, ctx: &OpContext, server: &str, filter: Filter) -> RecordStream<F::Domain> {
        self.stream(ctx, server, filter, id_order())
    }

    fn query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &Query,
    ) -> RecordStream<F::Domain> {
        if let Err(err) = query.validate() {
            return RecordStream::failed(AppError::invalid_argument(err));
        }
        let by_id = match query.id.as_deref().map(id_filter).transpose() {
            Ok(by_id) => by_id,
            Err(err) => return RecordStream::failed(err),
        };
        let filter = filter
            .and_maybe(by_id)
            .and_maybe(QueryHelper::build_filter(query));
        self.stream(ctx, server, filter, QueryHelper::query_options(query))
    }

    fn time_query(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        query: &TimeQuery,
    ) -> RecordStream<F::Domain> {
        if let Err(err) = query.validate() {
            return RecordStream::failed(AppError::invalid_argument(err));
        }
        let by_id = match query.query.id.as_deref().map(id_filter).transpose() {
            Ok(by_id) => by_id,
            Err(err) => return RecordStream::failed(err),
        };
        let (keyset, range) = self.helper.build_date_filter(query);
        let filter = filter
            .and_maybe(by_id)
            .and_maybe(keyset)
            .and_maybe(range);
        self.stream(ctx, server, filter, QueryHelper::query_options(&query.query))
    }

    async fn find_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
    ) -> Result<F::Domain, AppError> {
        let collection = self.resolve(server)?;
        let doc = ctx
            .run(collection.find_one(&filter, &FindOptions::new()))
            .await?
            .ok_or_else(|| AppError::not_found(format!("no record in '{}'", collection.name())))?;
        self.factory.decode(&doc)
    }

    async fn find_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<F::Domain, AppError> {
        let filter = id_filter(id)?;
        self.find_one(ctx, server, filter)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => AppError::not_found(format!("record '{id}' not found")),
                _ => err,
            })
    }

    async fn find_by_ids(
        &self,
        ctx: &OpContext,
        server: &str,
        ids: &[String],
    ) -> Result<Vec<F::Domain>, AppError> {
        let ids = ids
            .iter()
            .map(|id| parse_object_id(id).map(Value::from))
            .collect::<Result<Vec<_>, _>>()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_all(ctx, server, &Filter::is_in(KEYSET_FIELD, ids), &id_order())
            .await
    }

    async fn count(&self, ctx: &OpContext, server: &str, filter: Filter) -> Result<u64, AppError> {
        let collection = self.resolve(server)?;
        Ok(ctx.run(collection.count(&filter)).await?)
    }

    async fn document_exists(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
    ) -> Result<bool, AppError> {
        let filter = id_filter(id)?;
        Ok(self.count(ctx, server, filter).await? > 0)
    }
}
