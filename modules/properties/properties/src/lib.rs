//! Properties module implementation.
//!
//! Property and owner records kept per server in a document store, fronted by a read-through
//! cache and served through validated, logged commands and queries. The public models live in
//! `properties-sdk` and are re-exported here.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use properties_sdk::{
    ListParams, Metadata, NewOwnerParams, NewPropertyParams, Owner, Property, PropertyPage,
    SaleType, UpdateOwnerParams, UpdatePropertyParams,
};

pub mod module;
pub use module::{PropertiesModule, init_tracing};

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
