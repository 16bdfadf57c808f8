//! Repository facades over the document store.
//!
//! The facades are the only place that builds listing pipelines. Failures reach callers exactly
//! as the persistence layer classified them.

mod owner_repo;
mod property_repo;

pub use owner_repo::DocOwnerRepository;
pub use property_repo::DocPropertyRepository;

/// Listing defaults applied by [`DocPropertyRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingConfig {
    pub search_index: String,
    pub default_limit: u64,
    pub max_limit: u64,
}

impl ListingConfig {
    /// Effective page size for a requested `limit`; `0` asks for the default.
    #[must_use]
    pub fn page_size(&self, limit: u64) -> u64 {
        if limit == 0 {
            self.default_limit
        } else {
            limit.min(self.max_limit)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_clamps() {
        let listing = ListingConfig {
            search_index: "default".to_owned(),
            default_limit: 25,
            max_limit: 100,
        };
        assert_eq!(listing.page_size(0), 25);
        assert_eq!(listing.page_size(2), 2);
        assert_eq!(listing.page_size(5000), 100);
    }
}
