//! Pagination window and response metadata

use serde::{Deserialize, Serialize};

/// Row window handed to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of rows to skip
    pub offset: u64,
    /// Maximum number of rows to return
    pub limit: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-based page number
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        Self {
            offset: page_number.saturating_sub(1).saturating_mul(page_size),
            limit: page_size,
        }
    }
}

/// Pagination metadata returned alongside list data
///
/// Serialized as `{ page, limit, total, totalPages, hasNext, hasPrevious }`.
///
/// # Example
///
/// ```rust
/// use catalog_service::query::PageMeta;
///
/// let meta = PageMeta::new(2, 5, 12);
/// assert_eq!(meta.total_pages, 3);
/// assert!(meta.has_next);
/// assert!(meta.has_previous);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    /// Compute metadata for a page of `limit` rows out of `total`
    #[must_use]
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
            has_next: page.saturating_mul(limit) < total,
            has_previous: page > 1,
        }
    }
}

fn total_pages(total: u64, limit: u64) -> u64 {
    // Ceiling division: (total + limit - 1) / limit
    total.saturating_add(limit).saturating_sub(1) / limit
}
