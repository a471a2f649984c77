//! Books and their author, category and publisher links

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{Record, SortKey};
use crate::validation::{FieldRule, Schema, Validated};

use super::{AuthorRef, CategoryRef, PublisherRef};

/// A book with its relations resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub year: i32,
    #[serde(rename = "publisherId")]
    pub publisher_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub publisher: Option<PublisherRef>,
    pub authors: Vec<AuthorRef>,
    pub categories: Vec<CategoryRef>,
}

/// Book fields embedded in author, category and publisher responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub year: i32,
    #[serde(rename = "publisherId")]
    pub publisher_id: i64,
}

/// Create or full-update payload for a book
///
/// Link lists replace the book's existing links entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub title: String,
    pub description: String,
    pub year: i32,
    pub author_ids: Vec<i64>,
    pub category_ids: Vec<i64>,
    pub publisher_id: i64,
}

impl BookDraft {
    /// Drop repeated link ids, keeping first occurrences in order
    #[must_use]
    pub fn dedup_links(mut self) -> Self {
        dedup_in_order(&mut self.author_ids);
        dedup_in_order(&mut self.category_ids);
        self
    }
}

fn dedup_in_order(ids: &mut Vec<i64>) {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

pub const BOOK_SCHEMA: Schema = &[
    FieldRule::text("title", "Title").max_len(255),
    FieldRule::text("description", "Description"),
    FieldRule::integer("year", "Year").between(1000, 9999),
    FieldRule::ids("authorIds", "Author IDs", "At least one author is required"),
    FieldRule::ids("categoryIds", "Category IDs", "At least one category is required"),
    FieldRule::positive("publisherId", "Publisher ID"),
];

impl Validated for BookDraft {
    const SCHEMA: Schema = BOOK_SCHEMA;
}

/// Aggregate figures over the whole catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookStats {
    pub total_books: u64,
    pub earliest_year: Option<i32>,
    pub latest_year: Option<i32>,
    pub average_year: Option<f64>,
    pub by_category: Vec<CategoryCount>,
    pub by_publisher: Vec<PublisherCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: i64,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublisherCount {
    pub publisher_id: i64,
    pub name: String,
    pub count: u64,
}

impl Record for Book {
    fn id(&self) -> i64 {
        self.id
    }

    fn text_values(&self, field: &str) -> Vec<Cow<'_, str>> {
        match field {
            "title" => vec![Cow::Borrowed(self.title.as_str())],
            "description" => vec![Cow::Borrowed(self.description.as_str())],
            "authors.name" => self
                .authors
                .iter()
                .map(|a| Cow::Owned(a.full_name()))
                .collect(),
            "categories.name" => self
                .categories
                .iter()
                .map(|c| Cow::Borrowed(c.name.as_str()))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn integer_value(&self, field: &str) -> Option<i64> {
        match field {
            "id" => Some(self.id),
            "year" => Some(i64::from(self.year)),
            "publisher_id" => Some(self.publisher_id),
            _ => None,
        }
    }

    fn sort_key(&self, field: &str) -> SortKey<'_> {
        match field {
            "id" => SortKey::Integer(self.id),
            "title" => SortKey::Text(&self.title),
            "year" => SortKey::Integer(i64::from(self.year)),
            "created_at" => SortKey::Timestamp(self.created_at),
            "updated_at" => SortKey::Timestamp(self.updated_at),
            _ => SortKey::Missing,
        }
    }
}
