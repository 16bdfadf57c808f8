//! Search stages paginated with search-after / search-before tokens.

use serde::{Deserialize, Serialize};

use crate::options::SortSpec;
use crate::pipeline::{SearchOperator, SearchPage, SearchStage, Stage};
use crate::value::Value;

/// Which side of the pagination token to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SearchDirection {
    /// Ignore any token and start from the first hit.
    #[default]
    None,
    After,
    Before,
}

impl SearchDirection {
    /// Wire form: `0` none, `1` after, `2` before. Unknown values read as none.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::After,
            2 => Self::Before,
            _ => Self::None,
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::After => 1,
            Self::Before => 2,
        }
    }
}

fn page(direction: SearchDirection, token: &str) -> Option<SearchPage> {
    if token.is_empty() {
        return None;
    }
    match direction {
        SearchDirection::None => None,
        SearchDirection::After => Some(SearchPage::After(token.to_owned())),
        SearchDirection::Before => Some(SearchPage::Before(token.to_owned())),
    }
}

/// Full-text search on `path` for `value`.
#[must_use]
pub fn text_search(
    index: &str,
    path: &str,
    value: &str,
    sort: SortSpec,
    direction: SearchDirection,
    token: &str,
) -> Stage {
    Stage::Search(SearchStage {
        index: index.to_owned(),
        operator: SearchOperator::Text {
            query: value.to_owned(),
            path: path.to_owned(),
        },
        sort,
        page: page(direction, token),
    })
}

/// Exact-match search on `path` for `value`.
#[must_use]
pub fn equals_search(
    index: &str,
    path: &str,
    value: impl Into<Value>,
    sort: SortSpec,
    direction: SearchDirection,
    token: &str,
) -> Stage {
    Stage::Search(SearchStage {
        index: index.to_owned(),
        operator: SearchOperator::Equals {
            value: value.into(),
            path: path.to_owned(),
        },
        sort,
        page: page(direction, token),
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::options::SortDir;

    fn sort() -> SortSpec {
        vec![("Title".to_owned(), SortDir::Asc)]
    }

    #[test]
    fn token_is_attached_only_with_a_direction() {
        let Stage::Search(s) = text_search("default", "Category", "House", sort(), SearchDirection::After, "t")
        else {
            panic!("expected search stage");
        };
        assert_eq!(s.page, Some(SearchPage::After("t".to_owned())));

        let Stage::Search(s) = text_search("default", "Category", "House", sort(), SearchDirection::None, "t")
        else {
            panic!("expected search stage");
        };
        assert_eq!(s.page, None);
    }

    #[test]
    fn empty_token_means_first_page() {
        let Stage::Search(s) = equals_search("default", "OwnerID", "abc", sort(), SearchDirection::Before, "")
        else {
            panic!("expected search stage");
        };
        assert_eq!(s.page, None);
        assert_eq!(
            s.operator,
            SearchOperator::Equals {
                value: Value::from("abc"),
                path: "OwnerID".to_owned()
            }
        );
    }

    #[test]
    fn direction_codes() {
        assert_eq!(SearchDirection::from_code(1), SearchDirection::After);
        assert_eq!(SearchDirection::from_code(2), SearchDirection::Before);
        assert_eq!(SearchDirection::from_code(9), SearchDirection::None);
        assert_eq!(SearchDirection::Before.code(), 2);
    }
}
