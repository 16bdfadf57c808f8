//! Public contract of the properties module.
//!
//! Transport-agnostic models and operation parameters, together with the validation rules the
//! module enforces on them.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod models;
pub mod params;
pub mod validation;

pub use models::{InvalidSaleType, Metadata, Owner, Property, PropertyPage, SaleType};
pub use params::{
    ListParams, NewOwnerParams, NewPropertyParams, UpdateOwnerParams, UpdatePropertyParams,
};
pub use validation::validate_object_id;
