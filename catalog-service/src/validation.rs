//! Declarative field rules for request bodies
//!
//! A [`Schema`] is a static list of [`FieldRule`]s evaluated against a parsed
//! JSON body. Each rule reports at most one message, the first constraint its
//! field violates, and messages are derived from the field's label:
//!
//! ```rust
//! use catalog_service::validation::{FieldRule, Schema};
//! use serde_json::json;
//!
//! const SCHEMA: Schema = &[FieldRule::text("title", "Title").max_len(255)];
//!
//! let errors = catalog_service::validation::check(SCHEMA, &json!({})).unwrap_err();
//! assert_eq!(errors["title"], "Title is required");
//! ```
//!
//! Values must already have the right JSON type: `"1999"` is not a number.

use serde_json::{Map, Value};

use crate::error::FieldErrors;

/// Shape and bounds of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Non-blank string with an optional maximum length in characters
    Text { max_len: Option<usize> },
    /// Non-blank string containing a single `@` with text on both sides
    Email,
    /// Integer with optional inclusive bounds
    Integer { min: Option<i64>, max: Option<i64> },
    /// Integer greater than zero
    PositiveInteger,
    /// Non-empty array of positive integers
    IdList {
        /// Message when the array is empty
        empty_message: &'static str,
    },
}

/// Rule for one named field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// JSON key
    pub name: &'static str,
    /// Human label used in messages, e.g. `Publisher ID`
    pub label: &'static str,
    pub kind: RuleKind,
    /// Whether the label is plural (`Author IDs are required`)
    pub plural: bool,
}

/// A request body schema
pub type Schema = &'static [FieldRule];

/// A request body type whose JSON is checked against [`Self::SCHEMA`] before
/// it is deserialized
pub trait Validated: serde::de::DeserializeOwned {
    const SCHEMA: Schema;
}

impl FieldRule {
    #[must_use]
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: RuleKind::Text { max_len: None },
            plural: false,
        }
    }

    #[must_use]
    pub const fn email(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: RuleKind::Email,
            plural: false,
        }
    }

    #[must_use]
    pub const fn integer(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: RuleKind::Integer {
                min: None,
                max: None,
            },
            plural: false,
        }
    }

    #[must_use]
    pub const fn positive(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: RuleKind::PositiveInteger,
            plural: false,
        }
    }

    #[must_use]
    pub const fn ids(name: &'static str, label: &'static str, empty_message: &'static str) -> Self {
        Self {
            name,
            label,
            kind: RuleKind::IdList { empty_message },
            plural: true,
        }
    }

    /// Limit a text field to `max` characters
    #[must_use]
    pub const fn max_len(self, max: usize) -> Self {
        match self.kind {
            RuleKind::Text { .. } => Self {
                kind: RuleKind::Text { max_len: Some(max) },
                ..self
            },
            _ => self,
        }
    }

    /// Bound an integer field to `min..=max`
    #[must_use]
    pub const fn between(self, min: i64, max: i64) -> Self {
        match self.kind {
            RuleKind::Integer { .. } => Self {
                kind: RuleKind::Integer {
                    min: Some(min),
                    max: Some(max),
                },
                ..self
            },
            _ => self,
        }
    }

    fn required_message(&self) -> String {
        let verb = if self.plural { "are" } else { "is" };
        format!("{} {verb} required", self.label)
    }

    /// First violated constraint, or `None` when the value is acceptable
    fn violation(&self, value: Option<&Value>) -> Option<String> {
        let value = match value {
            None | Some(Value::Null) => return Some(self.required_message()),
            Some(value) => value,
        };

        match self.kind {
            RuleKind::Text { max_len } => {
                let Some(text) = value.as_str() else {
                    return Some(format!("{} must be a string", self.label));
                };
                if text.trim().is_empty() {
                    return Some(self.required_message());
                }
                match max_len {
                    Some(max) if text.chars().count() > max => {
                        Some(format!("{} cannot exceed {max} characters", self.label))
                    }
                    _ => None,
                }
            }
            RuleKind::Email => {
                let Some(text) = value.as_str() else {
                    return Some(format!("{} must be a string", self.label));
                };
                if text.trim().is_empty() {
                    return Some(self.required_message());
                }
                (!looks_like_email(text.trim()))
                    .then(|| format!("{} must be a valid email address", self.label))
            }
            RuleKind::Integer { min, max } => {
                let number = match integer(value) {
                    Ok(number) => number,
                    Err(message) => return Some(format!("{} {message}", self.label)),
                };
                if let Some(min) = min.filter(|min| number < *min) {
                    return Some(format!("{} must be at least {min}", self.label));
                }
                if let Some(max) = max.filter(|max| number > *max) {
                    return Some(format!("{} cannot exceed {max}", self.label));
                }
                None
            }
            RuleKind::PositiveInteger => match integer(value) {
                Err(message) => Some(format!("{} {message}", self.label)),
                Ok(number) if number <= 0 => Some(format!("{} must be positive", self.label)),
                Ok(_) => None,
            },
            RuleKind::IdList { empty_message } => {
                let Some(items) = value.as_array() else {
                    return Some(format!("{} must be an array", self.label));
                };
                if items.is_empty() {
                    return Some(empty_message.to_string());
                }
                items
                    .iter()
                    .any(|item| !matches!(integer(item), Ok(n) if n > 0))
                    .then(|| format!("{} must contain only positive integers", self.label))
            }
        }
    }
}

/// Integer from a JSON number, rejecting strings and any float notation
fn integer(value: &Value) -> Result<i64, &'static str> {
    let Value::Number(number) = value else {
        return Err("must be a number");
    };
    match (number.as_i64(), number.as_u64()) {
        (Some(n), _) => Ok(n),
        (None, Some(_)) => Err("is out of range"),
        (None, None) => Err("must be an integer"),
    }
}

fn looks_like_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !text.contains(' ')
        }
        None => false,
    }
}

/// Evaluate `schema` against an object body
///
/// Returns every failing field with its first message. Keys not named by the
/// schema are left alone.
pub fn check_object(schema: Schema, body: &Map<String, Value>) -> Result<(), FieldErrors> {
    let errors: FieldErrors = schema
        .iter()
        .filter_map(|rule| {
            rule.violation(body.get(rule.name))
                .map(|message| (rule.name.to_string(), message))
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Evaluate `schema` against any JSON value; non-objects fail every rule
pub fn check(schema: Schema, body: &Value) -> Result<(), FieldErrors> {
    match body {
        Value::Object(map) => check_object(schema, map),
        _ => check_object(schema, &Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOOK: Schema = &[
        FieldRule::text("title", "Title").max_len(255),
        FieldRule::text("description", "Description"),
        FieldRule::integer("year", "Year").between(1000, 9999),
        FieldRule::ids("authorIds", "Author IDs", "At least one author is required"),
        FieldRule::positive("publisherId", "Publisher ID"),
    ];

    fn valid_book() -> Value {
        json!({
            "title": "Dune",
            "description": "Spice",
            "year": 1965,
            "authorIds": [1, 2],
            "publisherId": 5
        })
    }

    fn error_for(body: Value, field: &str) -> String {
        check(BOOK, &body).unwrap_err()[field].clone()
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(check(BOOK, &valid_book()).is_ok());
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = check(BOOK, &json!({})).unwrap_err();
        assert_eq!(errors["title"], "Title is required");
        assert_eq!(errors["description"], "Description is required");
        assert_eq!(errors["year"], "Year is required");
        assert_eq!(errors["authorIds"], "Author IDs are required");
        assert_eq!(errors["publisherId"], "Publisher ID is required");
    }

    #[test]
    fn test_blank_text_is_required() {
        let mut body = valid_book();
        body["title"] = json!("   ");
        assert_eq!(error_for(body, "title"), "Title is required");
    }

    #[test]
    fn test_text_length_counts_characters() {
        let mut body = valid_book();
        body["title"] = json!("é".repeat(255));
        assert!(check(BOOK, &body).is_ok());

        body["title"] = json!("x".repeat(256));
        assert_eq!(error_for(body, "title"), "Title cannot exceed 255 characters");
    }

    #[test]
    fn test_integer_messages() {
        let mut body = valid_book();
        body["year"] = json!("1965");
        assert_eq!(error_for(body.clone(), "year"), "Year must be a number");

        body["year"] = json!(1965.5);
        assert_eq!(error_for(body.clone(), "year"), "Year must be an integer");

        body["year"] = json!(999);
        assert_eq!(error_for(body.clone(), "year"), "Year must be at least 1000");

        body["year"] = json!(10000);
        assert_eq!(error_for(body.clone(), "year"), "Year cannot exceed 9999");

        // fractional notation is rejected even when the value is whole
        body["year"] = json!(1965.0);
        assert_eq!(error_for(body, "year"), "Year must be an integer");
    }

    #[test]
    fn test_positive_integer() {
        let mut body = valid_book();
        body["publisherId"] = json!(0);
        assert_eq!(error_for(body.clone(), "publisherId"), "Publisher ID must be positive");

        body["publisherId"] = json!("5");
        assert_eq!(error_for(body, "publisherId"), "Publisher ID must be a number");
    }

    #[test]
    fn test_id_list_messages() {
        let mut body = valid_book();
        body["authorIds"] = json!(3);
        assert_eq!(error_for(body.clone(), "authorIds"), "Author IDs must be an array");

        body["authorIds"] = json!([]);
        assert_eq!(error_for(body.clone(), "authorIds"), "At least one author is required");

        body["authorIds"] = json!([1, -2]);
        assert_eq!(
            error_for(body, "authorIds"),
            "Author IDs must contain only positive integers"
        );
    }

    #[test]
    fn test_email_rule() {
        const LOGIN: Schema = &[FieldRule::email("email", "Email")];
        assert!(check(LOGIN, &json!({"email": "a@x.com"})).is_ok());
        assert_eq!(
            check(LOGIN, &json!({"email": "nope"})).unwrap_err()["email"],
            "Email must be a valid email address"
        );
        assert_eq!(
            check(LOGIN, &json!({"email": ""})).unwrap_err()["email"],
            "Email is required"
        );
    }

    #[test]
    fn test_non_object_body() {
        let errors = check(BOOK, &json!([1, 2])).unwrap_err();
        assert_eq!(errors.len(), BOOK.len());
    }
}
