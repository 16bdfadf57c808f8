//! Translation of query descriptors into store filters and find options.

use chrono::{Days, NaiveDate, NaiveTime};
use tracing::warn;

use crate::filter::Filter;
use crate::oid::ObjectId;
use crate::options::{FindOptions, SortDir};
use crate::query::{KEYSET_FIELD, Query, TimeQuery};

pub const DEFAULT_DATE_FIELD: &str = "Metadata.CreatedAt";

#[derive(Debug, Clone)]
pub struct QueryHelper {
    date_field: String,
}

impl Default for QueryHelper {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FIELD)
    }
}

impl QueryHelper {
    #[must_use]
    pub fn new(date_field: impl Into<String>) -> Self {
        Self {
            date_field: date_field.into(),
        }
    }

    /// Parse the cursor. A malformed cursor is dropped so the caller falls back to the first page.
    fn cursor(query: &Query) -> Option<ObjectId> {
        let raw = query.cursor.as_deref()?;
        match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(cursor = raw, error = %err, "ignoring invalid pagination cursor");
                None
            }
        }
    }

    fn keyset(cursor: ObjectId, dir: SortDir) -> Filter {
        match dir {
            SortDir::Asc => Filter::gt(KEYSET_FIELD, cursor),
            SortDir::Desc => Filter::lt(KEYSET_FIELD, cursor),
        }
    }

    /// Keyset filter for the page after `query.cursor`, or `None` for an unconstrained scan.
    #[must_use]
    pub fn build_filter(query: &Query) -> Option<Filter> {
        Self::cursor(query).map(|c| Self::keyset(c, query.direction()))
    }

    /// `(keyset, range)`: the keyset filter when a valid cursor is present, and the
    /// inclusive day range on the date field built from whichever bounds are set.
    /// Callers AND both; the keyset replaces skip, never the window.
    #[must_use]
    pub fn build_date_filter(&self, query: &TimeQuery) -> (Option<Filter>, Option<Filter>) {
        let keyset = Self::build_filter(&query.query);

        let start = query
            .start_date
            .map(|d| Filter::gte(self.date_field.clone(), start_of_day(d)));
        let end = query
            .end_date
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(|d| Filter::lt(self.date_field.clone(), start_of_day(d)));

        let range = match (start, end) {
            (Some(s), Some(e)) => Some(s.and(e)),
            (s, e) => s.or(e),
        };
        (keyset, range)
    }

    /// Sort by `sort_field` (with `_id` as tiebreaker) in `order`; apply `limit` when
    /// non-zero and `skip` only when `use_skip`.
    #[must_use]
    pub fn build_options(
        limit: u64,
        order: SortDir,
        skip: u64,
        sort_field: &str,
        use_skip: bool,
    ) -> FindOptions {
        let mut opts = FindOptions::new().sort_by(sort_field, order);
        if sort_field != KEYSET_FIELD {
            opts = opts.sort_by(KEYSET_FIELD, order);
        }
        if limit > 0 {
            opts = opts.limit(limit);
        }
        if use_skip && skip > 0 {
            opts = opts.skip(skip);
        }
        opts
    }

    /// Options for `query`; skip applies only when no usable cursor is present.
    #[must_use]
    pub fn query_options(query: &Query) -> FindOptions {
        let use_skip = Self::cursor(query).is_none();
        Self::build_options(
            query.limit,
            query.direction(),
            query.skip,
            query.sort_field(),
            use_skip,
        )
    }
}

fn start_of_day(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::doc;
    use tracing_test::traced_test;

    #[test]
    fn no_cursor_means_unconstrained_scan_with_skip() {
        let q = Query::new("eu").with_skip(5).with_limit(10);
        assert!(QueryHelper::build_filter(&q).is_none());
        let opts = QueryHelper::query_options(&q);
        assert_eq!(opts.skip, Some(5));
        assert_eq!(opts.limit, Some(10));
        assert_eq!(opts.sort, vec![("_id".to_owned(), SortDir::Asc)]);
    }

    #[test]
    fn cursor_replaces_skip_with_strict_keyset() {
        let cursor = ObjectId::new();
        let q = Query::new("eu")
            .with_cursor(cursor.to_hex())
            .with_skip(5)
            .with_order(SortDir::Desc);
        assert_eq!(QueryHelper::build_filter(&q), Some(Filter::lt("_id", cursor)));
        assert_eq!(QueryHelper::query_options(&q).skip, None);
    }

    #[test]
    #[traced_test]
    fn invalid_cursor_degrades_to_first_page() {
        let q = Query::new("eu").with_cursor("zz").with_skip(2);
        assert!(QueryHelper::build_filter(&q).is_none());
        assert_eq!(QueryHelper::query_options(&q).skip, Some(2));
        assert!(logs_contain("ignoring invalid pagination cursor"));
    }

    #[test]
    fn custom_sort_field_gets_id_tiebreaker() {
        let opts = QueryHelper::build_options(0, SortDir::Desc, 3, "Title", false);
        assert_eq!(
            opts.sort,
            vec![
                ("Title".to_owned(), SortDir::Desc),
                ("_id".to_owned(), SortDir::Desc)
            ]
        );
        assert_eq!(opts.limit, None);
        assert_eq!(opts.skip, None);
    }

    #[test]
    fn date_range_covers_whole_days() {
        let h = QueryHelper::default();
        let d = |s: &str| s.parse::<NaiveDate>().ok();
        let tq = TimeQuery::new(Query::new("eu")).between(d("2024-01-01"), d("2024-01-02"));
        let (keyset, range) = h.build_date_filter(&tq);
        assert!(keyset.is_none());
        let range = range.unwrap();

        let at = |s: &str| {
            let ts = s.parse::<chrono::DateTime<chrono::Utc>>().unwrap();
            doc! { "Metadata" => doc! { "CreatedAt" => ts } }
        };
        assert!(range.matches(&at("2024-01-01T00:00:00Z")));
        assert!(range.matches(&at("2024-01-02T23:59:59Z")));
        assert!(!range.matches(&at("2024-01-03T00:00:00Z")));
        assert!(!range.matches(&at("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn date_filter_keeps_the_window_alongside_the_keyset() {
        let h = QueryHelper::default();
        let cursor = ObjectId::new();
        let tq = TimeQuery::new(Query::new("eu").with_cursor(cursor.to_hex()))
            .between("2024-01-01".parse().ok(), None);
        let (keyset, range) = h.build_date_filter(&tq);
        assert_eq!(keyset, Some(Filter::gt("_id", cursor)));
        assert!(range.is_some());

        let garbage = TimeQuery::new(Query::new("eu").with_cursor("zz"))
            .between(None, "2024-01-01".parse().ok());
        let (keyset, range) = h.build_date_filter(&garbage);
        assert!(keyset.is_none());
        assert!(range.is_some());
    }
}
