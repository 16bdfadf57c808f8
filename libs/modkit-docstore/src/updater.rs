use async_trait::async_trait;
use modkit_errors::AppError;
use tracing::debug;

use crate::collection::{DocCollection, parse_object_id};
use crate::context::OpContext;
use crate::error::StoreError;
use crate::factory::{Factory, RecordDecoder, encode};
use crate::filter::{Filter, Update};
use crate::options::ReturnDocument;
use crate::query::KEYSET_FIELD;

#[async_trait]
pub trait Updater<T: Send + Sync + 'static>: Send + Sync {
    /// Apply `update` to the first record matching `filter`.
    ///
    /// # Errors
    /// `NotFound` when nothing matched, otherwise store failures.
    async fn update_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<(), AppError>;

    /// # Errors
    /// `InvalidArgument` for a malformed id, `NotFound` when nothing matched.
    async fn update_one_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        update: Update,
    ) -> Result<(), AppError>;

    /// Replace the first record matching `filter` with `record`, keeping its identifier.
    /// Returns the hex identifier of `record`.
    ///
    /// # Errors
    /// `NotFound` wrapping [`StoreError::NoUpdate`] when nothing was matched, modified or
    /// upserted.
    async fn replace_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        record: &T,
    ) -> Result<String, AppError>;

    /// Atomically update the first match and return it as it is after the update.
    ///
    /// # Errors
    /// `NotFound` when nothing matched; decode failures are internal errors.
    async fn update_and_find(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<T, AppError>;
}

#[async_trait]
impl<F: Factory> Updater<F::Domain> for DocCollection<F> {
    async fn update_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<(), AppError> {
        let collection = self.resolve(server)?;
        let res = ctx
            .run(collection.update_one(&filter, &update, false))
            .await?;
        if res.matched == 0 {
            return Err(AppError::not_found(format!(
                "no record to update in '{}'",
                collection.name()
            )));
        }
        debug!(collection = collection.name(), modified = res.modified, "updated record");
        Ok(())
    }

    async fn update_one_by_id(
        &self,
        ctx: &OpContext,
        server: &str,
        id: &str,
        update: Update,
    ) -> Result<(), AppError> {
        let filter = Filter::eq(KEYSET_FIELD, parse_object_id(id)?);
        self.update_one(ctx, server, filter, update).await
    }

    async fn replace_one(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        record: &F::Domain,
    ) -> Result<String, AppError> {
        let doc = encode(self.factory.as_ref(), record)?;
        let id = doc.get_object_id(KEYSET_FIELD).ok().map(|id| id.to_hex());
        let collection = self.resolve(server)?;
        let res = ctx
            .run(collection.replace_one(&filter, doc, false))
            .await?;
        if !res.touched() {
            return Err(StoreError::NoUpdate.into());
        }
        Ok(id.unwrap_or_default())
    }

    async fn update_and_find(
        &self,
        ctx: &OpContext,
        server: &str,
        filter: Filter,
        update: Update,
    ) -> Result<F::Domain, AppError> {
        let collection = self.resolve(server)?;
        let doc = ctx
            .run(collection.find_one_and_update(&filter, &update, ReturnDocument::After))
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("no record to update in '{}'", collection.name()))
            })?;
        self.factory.decode(&doc)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::finder::Finder;
    use crate::inserter::Inserter;
    use crate::memory::MemoryConnector;
    use crate::oid::ObjectId;
    use crate::store::Connector;
    use crate::testing::{NoteFactory, note};
    use modkit_errors::ErrorKind;
    use std::sync::Arc;

    async fn notes() -> DocCollection<NoteFactory> {
        let conn = Arc::new(MemoryConnector::new("db"));
        conn.create_collection("eu_notes").await.unwrap();
        DocCollection::new(conn, Arc::new(NoteFactory), "_notes")
    }

    #[tokio::test]
    async fn update_by_id_touches_only_that_record() {
        let notes = notes().await;
        let ctx = OpContext::new();
        let a = notes.insert_one(&ctx, "eu", &note(1, "a")).await.unwrap();
        let b = notes.insert_one(&ctx, "eu", &note(2, "b")).await.unwrap();

        notes
            .update_one_by_id(&ctx, "eu", &a, Update::new().set("Text", "changed"))
            .await
            .unwrap();
        assert_eq!(notes.find_by_id(&ctx, "eu", &a).await.unwrap().text, "changed");
        assert_eq!(notes.find_by_id(&ctx, "eu", &b).await.unwrap().text, "b");
    }

    #[tokio::test]
    async fn updating_nothing_is_not_found() {
        let notes = notes().await;
        let ctx = OpContext::new();
        let missing = ObjectId::new().to_hex();
        let err = notes
            .update_one_by_id(&ctx, "eu", &missing, Update::new().set("Text", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = notes
            .update_one_by_id(&ctx, "eu", "zz", Update::new().set("Text", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn replace_reports_no_update_as_not_found() {
        let notes = notes().await;
        let ctx = OpContext::new();
        let id = notes.insert_one(&ctx, "eu", &note(1, "a")).await.unwrap();

        let mut replacement = note(7, "replaced");
        replacement.id.clone_from(&id);
        let filter = Filter::eq(KEYSET_FIELD, parse_object_id(&id).unwrap());
        assert_eq!(notes.replace_one(&ctx, "eu", filter, &replacement).await.unwrap(), id);
        assert_eq!(notes.find_by_id(&ctx, "eu", &id).await.unwrap().seq, 7);

        let err = notes
            .replace_one(&ctx, "eu", Filter::eq("Seq", 99i64), &replacement)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NoUpdate)));
    }

    #[tokio::test]
    async fn update_and_find_returns_the_post_image() {
        let notes = notes().await;
        let ctx = OpContext::new();
        notes.insert_one(&ctx, "eu", &note(1, "a")).await.unwrap();
        let after = notes
            .update_and_find(&ctx, "eu", Filter::eq("Seq", 1i64), Update::new().set("Text", "z"))
            .await
            .unwrap();
        assert_eq!(after.text, "z");

        let err = notes
            .update_and_find(&ctx, "eu", Filter::eq("Seq", 2i64), Update::new().set("Text", "z"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
