//! Field access used to evaluate predicates and orderings in process

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

/// Comparable value of a sortable field
///
/// Variants are only ever compared against the same field of another record,
/// so mixed-variant ordering never decides a result in practice. Text orders
/// case-insensitively, falling back to byte order only for keys that differ
/// in case alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey<'a> {
    /// Field absent on this record; sorts first
    Missing,
    /// Integer column
    Integer(i64),
    /// Text column
    Text(&'a str),
    /// Timestamp column
    Timestamp(DateTime<Utc>),
}

impl SortKey<'_> {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Integer(_) => 1,
            Self::Text(_) => 2,
            Self::Timestamp(_) => 3,
        }
    }
}

impl Ord for SortKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
                .then_with(|| a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A record whose logical fields can be read by name
pub trait Record {
    /// Primary key, used as the ordering tie-breaker
    fn id(&self) -> i64;

    /// Text values of a field
    ///
    /// Relation fields such as `authors.name` yield one value per linked row;
    /// unknown fields yield nothing.
    fn text_values(&self, field: &str) -> Vec<Cow<'_, str>>;

    /// Integer value of a field, `None` when the field is unknown
    fn integer_value(&self, field: &str) -> Option<i64>;

    /// Sort key of a field
    fn sort_key(&self, field: &str) -> SortKey<'_>;
}

/// Case-insensitive substring test
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("The Great Gatsby", "great"));
        assert!(contains_ignore_case("DUNE", "un"));
        assert!(!contains_ignore_case("Dune", "gatsby"));
    }

    #[test]
    fn test_sort_key_ordering() {
        assert!(SortKey::Integer(1) < SortKey::Integer(2));
        assert!(SortKey::Text("a") < SortKey::Text("b"));
        assert!(SortKey::Missing < SortKey::Integer(i64::MIN));
    }

    #[test]
    fn test_text_keys_ignore_case() {
        assert!(SortKey::Text("apple") < SortKey::Text("Zebra"));
        assert!(SortKey::Text("Émile") > SortKey::Text("éa"));
        assert!(SortKey::Text("Apple") < SortKey::Text("apple"));
        assert_eq!(SortKey::Text("same").cmp(&SortKey::Text("same")), Ordering::Equal);
    }
}
