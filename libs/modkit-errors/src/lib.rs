//! Application error taxonomy shared by the persistence and application layers.
//!
//! Every fault is classified exactly once into an [`AppError`]: a [`Layer`] tag saying where
//! the fault was first observed, an [`ErrorKind`] from the catalog, and the underlying cause.
//! Upstream code inspects the kind, layer or cause but never re-wraps.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod app_error;
pub mod catalog;

pub use app_error::{AppError, AppResult, Layer};
pub use catalog::{ErrDef, ErrorKind};
