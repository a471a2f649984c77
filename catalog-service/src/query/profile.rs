//! Per-resource whitelists for list queries
//!
//! A [`QueryProfile`] is the only thing that differs between the list
//! endpoints. It names the fields a resource lets clients search, filter and
//! sort by, plus the ordering used when the client asks for none.
//!
//! Field names are logical: storage backends map them to columns or
//! accessors. Relation fields use a dotted form such as `authors.name`.

use super::sort::{SortDirection, SortSpec};

/// How a query parameter constrains its field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Case-insensitive substring match on a text field
    Contains,
    /// Exact match on an integer field
    Equals,
    /// Inclusive lower bound on an integer field
    Min,
    /// Inclusive upper bound on an integer field
    Max,
}

impl FilterKind {
    /// Whether the parameter value must parse as an integer
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        !matches!(self, Self::Contains)
    }
}

/// Binding of one query parameter to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldFilter {
    /// Query parameter name, e.g. `minYear`
    pub param: &'static str,
    /// Logical field the condition applies to, e.g. `year`
    pub field: &'static str,
    /// Comparison applied to the field
    pub kind: FilterKind,
}

impl FieldFilter {
    /// Bind `param` to `field` with the given comparison
    #[must_use]
    pub const fn new(param: &'static str, field: &'static str, kind: FilterKind) -> Self {
        Self { param, field, kind }
    }

    /// Substring filter whose parameter is named after the field
    #[must_use]
    pub const fn contains(field: &'static str) -> Self {
        Self::new(field, field, FilterKind::Contains)
    }
}

/// Whitelist configuration for one resource's list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryProfile {
    /// Resource name used in logs
    pub resource: &'static str,
    /// Fields matched by the free-text `search` parameter
    pub searchable: &'static [&'static str],
    /// Query parameters that become field conditions
    pub filters: &'static [FieldFilter],
    /// Fields the client may sort by
    pub sortable: &'static [&'static str],
    /// Ordering applied when `sort` is absent or not whitelisted
    pub default_sort: SortSpec,
}

impl QueryProfile {
    /// Look up the whitelisted sort field matching `name`
    ///
    /// Returns the profile's own `'static` string so a resolved sort can never
    /// name a field outside the whitelist.
    #[must_use]
    pub fn sortable_field(&self, name: &str) -> Option<&'static str> {
        self.sortable.iter().copied().find(|field| *field == name)
    }
}

/// Creation time, newest first
pub const NEWEST_FIRST: SortSpec = SortSpec::new("created_at", SortDirection::Descending);

/// Books: searchable by title and description, filterable by year range,
/// publisher and linked author or category names
pub const BOOKS: QueryProfile = QueryProfile {
    resource: "books",
    searchable: &["title", "description"],
    filters: &[
        FieldFilter::contains("title"),
        FieldFilter::contains("description"),
        FieldFilter::new("year", "year", FilterKind::Equals),
        FieldFilter::new("minYear", "year", FilterKind::Min),
        FieldFilter::new("maxYear", "year", FilterKind::Max),
        FieldFilter::new("publisherId", "publisher_id", FilterKind::Equals),
        FieldFilter::new("author", "authors.name", FilterKind::Contains),
        FieldFilter::new("category", "categories.name", FilterKind::Contains),
    ],
    sortable: &["id", "title", "year", "created_at", "updated_at"],
    default_sort: NEWEST_FIRST,
};

pub const AUTHORS: QueryProfile = QueryProfile {
    resource: "authors",
    searchable: &["first_name", "last_name"],
    filters: &[
        FieldFilter::contains("first_name"),
        FieldFilter::contains("last_name"),
    ],
    sortable: &["id", "first_name", "last_name", "created_at", "updated_at"],
    default_sort: NEWEST_FIRST,
};

pub const CATEGORIES: QueryProfile = QueryProfile {
    resource: "categories",
    searchable: &["name"],
    filters: &[FieldFilter::contains("name")],
    sortable: &["id", "name", "created_at", "updated_at"],
    default_sort: NEWEST_FIRST,
};

pub const PUBLISHERS: QueryProfile = QueryProfile {
    resource: "publishers",
    searchable: &["name"],
    filters: &[FieldFilter::contains("name")],
    sortable: &["id", "name", "created_at", "updated_at"],
    default_sort: NEWEST_FIRST,
};
