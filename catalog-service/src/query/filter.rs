//! Filter predicate construction
//!
//! [`build_predicate`] reads the raw query parameters named by a profile's
//! whitelist and produces a [`FilterPredicate`]: a conjunction of field
//! conditions plus an optional free-text clause that must match at least one
//! searchable field. Parameters outside the whitelist never reach storage.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use catalog_service::query::{build_predicate, profile, FilterOperator};
//!
//! let raw: HashMap<String, String> = [
//!     ("minYear".to_string(), "1950".to_string()),
//!     ("search".to_string(), "dune".to_string()),
//!     ("drop".to_string(), "table".to_string()),
//! ]
//! .into_iter()
//! .collect();
//!
//! let predicate = build_predicate(&raw, &profile::BOOKS);
//! assert_eq!(predicate.conditions.len(), 1);
//! assert_eq!(predicate.conditions[0].operator, FilterOperator::AtLeast);
//! assert_eq!(predicate.search.unwrap().term, "dune");
//! ```

use std::fmt;

use super::normalize::{search_term, RawQuery};
use super::profile::{FilterKind, QueryProfile};
use super::record::{contains_ignore_case, Record};

/// Comparison applied by a [`FilterCondition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Case-insensitive substring match
    Contains,
    /// Equality
    Equal,
    /// Greater than or equal
    AtLeast,
    /// Less than or equal
    AtMost,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "ILIKE"),
            Self::Equal => write!(f, "="),
            Self::AtLeast => write!(f, ">="),
            Self::AtMost => write!(f, "<="),
        }
    }
}

impl From<FilterKind> for FilterOperator {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Contains => Self::Contains,
            FilterKind::Equals => Self::Equal,
            FilterKind::Min => Self::AtLeast,
            FilterKind::Max => Self::AtMost,
        }
    }
}

/// Value compared against a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

/// A single condition on one whitelisted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    pub field: &'static str,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

impl FilterCondition {
    /// Evaluate this condition against a record
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match (&self.operator, &self.value) {
            (FilterOperator::Contains, FilterValue::Text(term)) => record
                .text_values(self.field)
                .iter()
                .any(|value| contains_ignore_case(value, term)),
            (FilterOperator::Equal, FilterValue::Text(term)) => record
                .text_values(self.field)
                .iter()
                .any(|value| value.as_ref() == term),
            (operator, FilterValue::Integer(expected)) => {
                let Some(actual) = record.integer_value(self.field) else {
                    return false;
                };
                match operator {
                    FilterOperator::Equal | FilterOperator::Contains => actual == *expected,
                    FilterOperator::AtLeast => actual >= *expected,
                    FilterOperator::AtMost => actual <= *expected,
                }
            }
            (FilterOperator::AtLeast | FilterOperator::AtMost, FilterValue::Text(_)) => false,
        }
    }
}

/// Free-text term matched against any of several fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    pub term: String,
    pub fields: &'static [&'static str],
}

impl SearchClause {
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.fields.iter().any(|field| {
            record
                .text_values(field)
                .iter()
                .any(|value| contains_ignore_case(value, &self.term))
        })
    }
}

/// Conjunction of field conditions and an optional search clause
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPredicate {
    pub conditions: Vec<FilterCondition>,
    pub search: Option<SearchClause>,
}

impl FilterPredicate {
    /// A predicate matching every record
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.search.is_none()
    }

    /// Evaluate the whole predicate against a record
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
            && self.search.as_ref().map_or(true, |s| s.matches(record))
    }
}

/// Build the predicate for a list request
///
/// Empty values and numeric filters that fail to parse are skipped, the same
/// way malformed paging input degrades to defaults.
pub fn build_predicate(raw: &RawQuery, profile: &QueryProfile) -> FilterPredicate {
    let conditions = profile
        .filters
        .iter()
        .filter_map(|filter| {
            let value = raw.get(filter.param)?.trim();
            if value.is_empty() {
                return None;
            }
            let value = if filter.kind.is_numeric() {
                FilterValue::Integer(value.parse().ok()?)
            } else {
                FilterValue::Text(value.to_string())
            };
            Some(FilterCondition {
                field: filter.field,
                operator: filter.kind.into(),
                value,
            })
        })
        .collect();

    let search = search_term(raw).map(|term| SearchClause {
        term,
        fields: profile.searchable,
    });

    FilterPredicate { conditions, search }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::profile::{BOOKS, CATEGORIES};
    use crate::query::record::SortKey;
    use std::borrow::Cow;

    struct Row {
        id: i64,
        title: &'static str,
        description: &'static str,
        year: i64,
        authors: Vec<&'static str>,
    }

    impl Record for Row {
        fn id(&self) -> i64 {
            self.id
        }

        fn text_values(&self, field: &str) -> Vec<Cow<'_, str>> {
            match field {
                "title" => vec![Cow::Borrowed(self.title)],
                "description" => vec![Cow::Borrowed(self.description)],
                "authors.name" => self.authors.iter().map(|a| Cow::Borrowed(*a)).collect(),
                _ => Vec::new(),
            }
        }

        fn integer_value(&self, field: &str) -> Option<i64> {
            (field == "year").then_some(self.year)
        }

        fn sort_key(&self, _field: &str) -> SortKey<'_> {
            SortKey::Missing
        }
    }

    fn dune() -> Row {
        Row {
            id: 1,
            title: "Dune",
            description: "Desert planet epic",
            year: 1965,
            authors: vec!["Frank Herbert"],
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> RawQuery {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let predicate = build_predicate(&raw(&[("password", "x"), ("page", "2")]), &BOOKS);
        assert!(predicate.is_empty());
    }

    #[test]
    fn test_range_filters() {
        let predicate = build_predicate(&raw(&[("minYear", "1960"), ("maxYear", "1970")]), &BOOKS);
        assert_eq!(predicate.conditions.len(), 2);
        assert!(predicate.matches(&dune()));

        let predicate = build_predicate(&raw(&[("minYear", "1966")]), &BOOKS);
        assert!(!predicate.matches(&dune()));
    }

    #[test]
    fn test_unparseable_numeric_filter_is_skipped() {
        let predicate = build_predicate(&raw(&[("year", "nineteen")]), &BOOKS);
        assert!(predicate.conditions.is_empty());
    }

    #[test]
    fn test_empty_value_is_absent() {
        let predicate = build_predicate(&raw(&[("title", "  "), ("search", "")]), &BOOKS);
        assert!(predicate.is_empty());
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let predicate = build_predicate(&raw(&[("title", "DUN")]), &BOOKS);
        assert!(predicate.matches(&dune()));
    }

    #[test]
    fn test_search_matches_any_searchable_field() {
        let predicate = build_predicate(&raw(&[("search", "desert")]), &BOOKS);
        let search = predicate.search.clone().unwrap();
        assert_eq!(search.fields, &["title", "description"]);
        assert!(predicate.matches(&dune()));

        let predicate = build_predicate(&raw(&[("search", "gatsby")]), &BOOKS);
        assert!(!predicate.matches(&dune()));
    }

    #[test]
    fn test_field_filter_and_search_both_apply() {
        let predicate = build_predicate(&raw(&[("title", "dune"), ("search", "planet")]), &BOOKS);
        assert!(predicate.matches(&dune()));

        let predicate = build_predicate(&raw(&[("title", "dune"), ("search", "gatsby")]), &BOOKS);
        assert!(!predicate.matches(&dune()));
    }

    #[test]
    fn test_relation_filter() {
        let predicate = build_predicate(&raw(&[("author", "herbert")]), &BOOKS);
        assert_eq!(predicate.conditions[0].field, "authors.name");
        assert!(predicate.matches(&dune()));
    }

    #[test]
    fn test_profile_scopes_filters() {
        let predicate = build_predicate(&raw(&[("title", "dune")]), &CATEGORIES);
        assert!(predicate.conditions.is_empty());
    }
}
