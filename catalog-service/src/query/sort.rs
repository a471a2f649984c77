//! Sort token resolution
//!
//! A sort token is a field name, optionally prefixed with `-` for descending
//! order. Resolution against a [`QueryProfile`] never fails: a missing token or
//! a field outside the whitelist yields the profile's default ordering.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::query::{profile, resolve_sort, SortDirection};
//!
//! let sort = resolve_sort(Some("-title"), &profile::BOOKS);
//! assert_eq!(sort.field, "title");
//! assert_eq!(sort.direction, SortDirection::Descending);
//!
//! let fallback = resolve_sort(Some("password"), &profile::BOOKS);
//! assert_eq!(fallback, profile::BOOKS.default_sort);
//! ```

use std::cmp::Ordering;
use std::fmt;

use super::profile::QueryProfile;
use super::record::Record;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending order (A-Z, 0-9, oldest first)
    #[default]
    Ascending,
    /// Descending order (Z-A, 9-0, newest first)
    Descending,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl SortDirection {
    /// SQL keyword for this direction
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A whitelisted field and the direction to order it in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// Logical field name taken from a profile's whitelist
    pub field: &'static str,
    /// Ordering direction
    pub direction: SortDirection,
}

impl SortSpec {
    #[must_use]
    pub const fn new(field: &'static str, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compare two records by this field, breaking ties by ascending id
    pub fn compare<R: Record>(&self, a: &R, b: &R) -> Ordering {
        let primary = a.sort_key(self.field).cmp(&b.sort_key(self.field));
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// Split a raw sort token into a field name and a direction
///
/// Returns `None` for an empty token or a bare `-`.
#[must_use]
pub fn parse_sort_token(token: &str) -> Option<(&str, SortDirection)> {
    let token = token.trim();
    let (field, direction) = match token.strip_prefix('-') {
        Some(rest) => (rest, SortDirection::Descending),
        None => (token, SortDirection::Ascending),
    };
    (!field.is_empty()).then_some((field, direction))
}

/// Resolve a raw sort token against a profile's whitelist
#[must_use]
pub fn resolve_sort(token: Option<&str>, profile: &QueryProfile) -> SortSpec {
    token
        .and_then(parse_sort_token)
        .and_then(|(name, direction)| {
            profile
                .sortable_field(name)
                .map(|field| SortSpec::new(field, direction))
        })
        .unwrap_or(profile.default_sort)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::profile::{AUTHORS, BOOKS};

    #[test]
    fn test_parse_sort_token() {
        assert_eq!(
            parse_sort_token("title"),
            Some(("title", SortDirection::Ascending))
        );
        assert_eq!(
            parse_sort_token("-title"),
            Some(("title", SortDirection::Descending))
        );
        assert_eq!(parse_sort_token(""), None);
        assert_eq!(parse_sort_token("-"), None);
    }

    #[test]
    fn test_resolve_whitelisted_field() {
        let sort = resolve_sort(Some("title"), &BOOKS);
        assert_eq!(sort, SortSpec::new("title", SortDirection::Ascending));

        let sort = resolve_sort(Some("-year"), &BOOKS);
        assert_eq!(sort, SortSpec::new("year", SortDirection::Descending));
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(resolve_sort(None, &BOOKS), BOOKS.default_sort);
        assert_eq!(resolve_sort(Some("unknown"), &BOOKS), BOOKS.default_sort);
        assert_eq!(resolve_sort(Some("-"), &BOOKS), BOOKS.default_sort);
        // whitelists are per resource
        assert_eq!(resolve_sort(Some("title"), &AUTHORS), AUTHORS.default_sort);
    }

    #[test]
    fn test_default_is_newest_first() {
        let sort = resolve_sort(None, &BOOKS);
        assert_eq!(sort.field, "created_at");
        assert_eq!(sort.direction, SortDirection::Descending);
        assert_eq!(sort.to_string(), "created_at desc");
    }

    #[test]
    fn test_direction_sql() {
        assert_eq!(SortDirection::Ascending.as_sql(), "ASC");
        assert_eq!(SortDirection::Descending.as_sql(), "DESC");
    }
}
