use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{Record, SortKey};
use crate::validation::{FieldRule, Schema, Validated};

use super::BookSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Publisher {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub books: Vec<BookSummary>,
}

/// Publisher fields embedded in book responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublisherRef {
    pub id: i64,
    pub name: String,
}

/// Publisher names are unique
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PublisherDraft {
    pub name: String,
}

pub const PUBLISHER_SCHEMA: Schema = &[FieldRule::text("name", "Name").max_len(200)];

impl Validated for PublisherDraft {
    const SCHEMA: Schema = PUBLISHER_SCHEMA;
}

impl Record for Publisher {
    fn id(&self) -> i64 {
        self.id
    }

    fn text_values(&self, field: &str) -> Vec<Cow<'_, str>> {
        match field {
            "name" => vec![Cow::Borrowed(self.name.as_str())],
            _ => Vec::new(),
        }
    }

    fn integer_value(&self, field: &str) -> Option<i64> {
        (field == "id").then_some(self.id)
    }

    fn sort_key(&self, field: &str) -> SortKey<'_> {
        match field {
            "id" => SortKey::Integer(self.id),
            "name" => SortKey::Text(&self.name),
            "created_at" => SortKey::Timestamp(self.created_at),
            "updated_at" => SortKey::Timestamp(self.updated_at),
            _ => SortKey::Missing,
        }
    }
}
