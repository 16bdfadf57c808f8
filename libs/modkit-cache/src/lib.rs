//! Key/value cache contract and an in-memory implementation with TTL expiry.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod cacher;
pub mod error;
pub mod memory;

pub use cacher::Cacher;
pub use error::CacheError;
pub use memory::MemoryCacher;
