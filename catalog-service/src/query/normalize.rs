//! Query parameter normalization
//!
//! Turns the raw string map of a list request into bounded, typed values.
//! Nothing here fails: missing, non-numeric, zero or negative input falls back
//! to a default, and an oversized `limit` is clamped to the configured maximum.
//! Digit strings too long for `u64` count as `u64::MAX`, so a huge `limit`
//! clamps and a huge `page` lands past the last page.

use std::collections::HashMap;

use crate::config::ListingConfig;

use super::profile::QueryProfile;
use super::sort::{resolve_sort, SortSpec};

/// Raw query parameters of a request, as sent by the client
pub type RawQuery = HashMap<String, String>;

/// Typed, bounded list parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// 1-based page number, always >= 1
    pub page: u64,
    /// Page size, always within `1..=max_limit`
    pub limit: u64,
    /// Trimmed, non-empty free-text term
    pub search: Option<String>,
    /// Resolved ordering
    pub sort: SortSpec,
}

impl NormalizedQuery {
    /// Number of rows to skip: `(page - 1) * limit`
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Normalize raw parameters for one resource
pub fn normalize(raw: &RawQuery, profile: &QueryProfile, listing: &ListingConfig) -> NormalizedQuery {
    NormalizedQuery {
        page: page_number(raw),
        limit: page_size(raw, listing),
        search: search_term(raw),
        sort: resolve_sort(raw.get("sort").map(String::as_str), profile),
    }
}

fn positive(raw: &RawQuery, key: &str) -> Option<u64> {
    let value = raw.get(key)?.trim();
    match value.parse::<u64>() {
        Ok(number) => Some(number).filter(|v| *v >= 1),
        Err(_) if is_unsigned_digits(value) => Some(u64::MAX),
        Err(_) => None,
    }
}

fn is_unsigned_digits(value: &str) -> bool {
    let digits = value.strip_prefix('+').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn page_number(raw: &RawQuery) -> u64 {
    positive(raw, "page").unwrap_or(1)
}

fn page_size(raw: &RawQuery, listing: &ListingConfig) -> u64 {
    positive(raw, "limit")
        .unwrap_or(listing.default_limit)
        .min(listing.max_limit)
}

/// The `search` parameter, trimmed, if it is non-empty
pub(crate) fn search_term(raw: &RawQuery) -> Option<String> {
    raw.get("search")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::profile::BOOKS;
    use crate::query::sort::SortDirection;

    fn raw(pairs: &[(&str, &str)]) -> RawQuery {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn run(pairs: &[(&str, &str)]) -> NormalizedQuery {
        normalize(&raw(pairs), &BOOKS, &ListingConfig::default())
    }

    #[test]
    fn test_defaults_for_empty_query() {
        let q = run(&[]);
        assert_eq!(q.page, 1);
        assert_eq!(q.limit, 10);
        assert_eq!(q.search, None);
        assert_eq!(q.sort, BOOKS.default_sort);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_invalid_page_becomes_one() {
        for page in ["0", "-3", "abc", "", "1.5"] {
            assert_eq!(run(&[("page", page)]).page, 1, "page={page}");
        }
        assert_eq!(run(&[("page", " 4 ")]).page, 4);
    }

    #[test]
    fn test_invalid_limit_becomes_default() {
        for limit in ["0", "-1", "ten", ""] {
            assert_eq!(run(&[("limit", limit)]).limit, 10, "limit={limit}");
        }
    }

    #[test]
    fn test_limit_is_clamped_to_max() {
        assert_eq!(run(&[("limit", "500")]).limit, 100);
        assert_eq!(run(&[("limit", "100")]).limit, 100);
        assert_eq!(run(&[("limit", "25")]).limit, 25);
    }

    #[test]
    fn test_overflowing_numbers_saturate() {
        assert_eq!(run(&[("limit", "99999999999999999999999")]).limit, 100);
        assert_eq!(run(&[("limit", "+99999999999999999999999")]).limit, 100);
        assert_eq!(run(&[("limit", "-99999999999999999999999")]).limit, 10);

        let q = run(&[("page", "99999999999999999999999")]);
        assert_eq!(q.page, u64::MAX);
        assert_eq!(q.offset(), u64::MAX);
    }

    #[test]
    fn test_custom_listing_bounds() {
        let listing = ListingConfig {
            default_limit: 3,
            max_limit: 5,
        };
        let q = normalize(&raw(&[("limit", "9")]), &BOOKS, &listing);
        assert_eq!(q.limit, 5);
        let q = normalize(&raw(&[]), &BOOKS, &listing);
        assert_eq!(q.limit, 3);
    }

    #[test]
    fn test_offset() {
        let q = run(&[("page", "3"), ("limit", "5")]);
        assert_eq!(q.offset(), 10);
    }

    #[test]
    fn test_search_is_trimmed() {
        assert_eq!(run(&[("search", "  dune ")]).search.as_deref(), Some("dune"));
        assert_eq!(run(&[("search", "   ")]).search, None);
    }

    #[test]
    fn test_sort_is_resolved() {
        let q = run(&[("sort", "-year")]);
        assert_eq!(q.sort.field, "year");
        assert_eq!(q.sort.direction, SortDirection::Descending);
    }
}
