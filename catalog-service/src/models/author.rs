use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::{Record, SortKey};
use crate::validation::{FieldRule, Schema, Validated};

use super::BookSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub books: Vec<BookSummary>,
}

/// Author fields embedded in book responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorRef {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl AuthorRef {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuthorDraft {
    pub first_name: String,
    pub last_name: String,
}

pub const AUTHOR_SCHEMA: Schema = &[
    FieldRule::text("first_name", "First name").max_len(100),
    FieldRule::text("last_name", "Last name").max_len(100),
];

impl Validated for AuthorDraft {
    const SCHEMA: Schema = AUTHOR_SCHEMA;
}

impl Record for Author {
    fn id(&self) -> i64 {
        self.id
    }

    fn text_values(&self, field: &str) -> Vec<Cow<'_, str>> {
        match field {
            "first_name" => vec![Cow::Borrowed(self.first_name.as_str())],
            "last_name" => vec![Cow::Borrowed(self.last_name.as_str())],
            _ => Vec::new(),
        }
    }

    fn integer_value(&self, field: &str) -> Option<i64> {
        (field == "id").then_some(self.id)
    }

    fn sort_key(&self, field: &str) -> SortKey<'_> {
        match field {
            "id" => SortKey::Integer(self.id),
            "first_name" => SortKey::Text(&self.first_name),
            "last_name" => SortKey::Text(&self.last_name),
            "created_at" => SortKey::Timestamp(self.created_at),
            "updated_at" => SortKey::Timestamp(self.updated_at),
            _ => SortKey::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::check;
    use serde_json::json;

    #[test]
    fn test_schema_messages() {
        let errors = check(
            AUTHOR_SCHEMA,
            &json!({ "first_name": "", "last_name": "x".repeat(101) }),
        )
        .unwrap_err();
        assert_eq!(errors["first_name"], "First name is required");
        assert_eq!(errors["last_name"], "Last name cannot exceed 100 characters");
    }

    #[test]
    fn test_full_name() {
        let author = AuthorRef {
            id: 1,
            first_name: "Ursula".into(),
            last_name: "Le Guin".into(),
        };
        assert_eq!(author.full_name(), "Ursula Le Guin");
    }
}
