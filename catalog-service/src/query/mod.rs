//! List-query construction shared by every collection endpoint
//!
//! A list request flows through four stages, each a plain function over
//! values:
//!
//! 1. [`normalize`] bounds `page` and `limit` and extracts `search`
//! 2. [`build_predicate`] turns whitelisted parameters into a [`FilterPredicate`]
//! 3. [`resolve_sort`] maps the `sort` token to a whitelisted [`SortSpec`]
//! 4. [`PageMeta::new`] computes navigation metadata once storage reports a total
//!
//! [`ListQuery::build`] runs the first three against a [`QueryProfile`], which is
//! the only per-resource input.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use catalog_service::config::ListingConfig;
//! use catalog_service::query::{profile, ListQuery};
//!
//! let raw: HashMap<String, String> = [
//!     ("page".to_string(), "2".to_string()),
//!     ("limit".to_string(), "5".to_string()),
//!     ("sort".to_string(), "-title".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let query = ListQuery::build(&raw, &profile::BOOKS, &ListingConfig::default());
//! assert_eq!(query.pagination().offset, 5);
//! assert_eq!(query.meta(12).total_pages, 3);
//! ```

pub mod filter;
pub mod normalize;
pub mod pagination;
pub mod profile;
pub mod record;
pub mod sort;

pub use filter::{
    build_predicate, FilterCondition, FilterOperator, FilterPredicate, FilterValue, SearchClause,
};
pub use normalize::{normalize, NormalizedQuery, RawQuery};
pub use pagination::{PageMeta, Pagination};
pub use profile::{FieldFilter, FilterKind, QueryProfile};
pub use record::{Record, SortKey};
pub use sort::{parse_sort_token, resolve_sort, SortDirection, SortSpec};

use crate::config::ListingConfig;

/// Everything storage needs to answer one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Bounded paging and resolved sort
    pub normalized: NormalizedQuery,
    /// Whitelisted conditions and search clause
    pub predicate: FilterPredicate,
}

impl ListQuery {
    /// Build a list query from raw parameters and a resource profile
    pub fn build(raw: &RawQuery, profile: &QueryProfile, listing: &ListingConfig) -> Self {
        let normalized = normalize(raw, profile, listing);
        let predicate = build_predicate(raw, profile);

        tracing::debug!(
            resource = profile.resource,
            page = normalized.page,
            limit = normalized.limit,
            sort = %normalized.sort,
            conditions = predicate.conditions.len(),
            search = predicate.search.is_some(),
            "Normalized list query"
        );

        Self {
            normalized,
            predicate,
        }
    }

    #[must_use]
    pub fn sort(&self) -> SortSpec {
        self.normalized.sort
    }

    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.normalized.page, self.normalized.limit)
    }

    /// Metadata for this page given the total number of matching rows
    #[must_use]
    pub fn meta(&self, total: u64) -> PageMeta {
        PageMeta::new(self.normalized.page, self.normalized.limit, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_combines_stages() {
        let raw: RawQuery = [
            ("page", "2"),
            ("limit", "5"),
            ("sort", "title"),
            ("search", "the"),
            ("minYear", "1900"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let query = ListQuery::build(&raw, &profile::BOOKS, &ListingConfig::default());
        assert_eq!(query.pagination(), Pagination::new(5, 5));
        assert_eq!(query.sort(), SortSpec::new("title", SortDirection::Ascending));
        assert_eq!(query.predicate.conditions.len(), 1);
        assert!(query.predicate.search.is_some());

        let meta = query.meta(12);
        assert_eq!(meta.total, 12);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.limit, 5);
    }
}
