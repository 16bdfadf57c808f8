//! Store-backed repositories and the caching layer over them.

pub mod cached;
pub mod storage;
