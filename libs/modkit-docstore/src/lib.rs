//! Generic persistence layer over a document-oriented store.
//!
//! The crate is organised leaf-first:
//! - [`value`], [`oid`], [`filter`], [`options`], [`pipeline`]: store-native data types
//! - [`store`]: the collaborator contracts a backend implements ([`memory`] ships one)
//! - [`query`], [`helper`], [`pagination`]: query descriptors and their translation
//! - [`factory`]: domain / storage record mapping
//! - [`iterator`], [`stream`]: pull-based result delivery
//! - [`finder`], [`inserter`], [`updater`], [`remover`], [`grouper`], [`creator`]: capability
//!   contracts, implemented for [`DocCollection`] and composable through [`composite`]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod collection;
pub mod composite;
pub mod context;
pub mod creator;
pub mod error;
pub mod factory;
pub mod filter;
pub mod finder;
pub mod grouper;
pub mod helper;
pub mod inserter;
pub mod iterator;
pub mod memory;
pub mod oid;
pub mod options;
pub mod pagination;
pub mod pipeline;
pub mod query;
pub mod remover;
pub mod store;
pub mod stream;
#[cfg(test)]
mod testing;
pub mod updater;
pub mod value;

pub use collection::DocCollection;
pub use composite::{Composite, DocumentStore, FinderInserterUpdaterRemover};
pub use context::OpContext;
pub use creator::Creator;
pub use error::{DecodeError, ObjectIdError, StoreError, TokenError};
pub use factory::{Factory, RecordDecoder, StorageRecord};
pub use filter::{CompareOp, Filter, Update};
pub use finder::Finder;
pub use grouper::Grouper;
pub use helper::QueryHelper;
pub use inserter::Inserter;
pub use iterator::RecordIterator;
pub use memory::MemoryConnector;
pub use oid::ObjectId;
pub use options::{FindOptions, IndexModel, ReturnDocument, SortDir, SortSpec, UpdateResult};
pub use pagination::SearchDirection;
pub use pipeline::{MetaField, Pipeline, Projection, SearchOperator, SearchPage, SearchStage, Stage};
pub use query::{Query, TimeQuery};
pub use remover::Remover;
pub use store::{Collection, Connector, DocCursor};
pub use stream::{BATCH_SIZE, Completion, RecordStream};
pub use updater::Updater;
pub use value::{Document, Value};
