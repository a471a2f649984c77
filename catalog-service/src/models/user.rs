use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::validation::{FieldRule, Schema, Validated};

/// A registered account
///
/// The password hash never leaves the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Storage payload for registration; the password is already hashed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

/// Register and login body
///
/// The email is trimmed and lowercased on the way in, so lookups and stored
/// accounts always see one canonical form.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Credentials {
    #[serde(deserialize_with = "canonical_email")]
    pub email: String,
    pub password: String,
}

fn canonical_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|email| email.trim().to_lowercase())
}

pub const CREDENTIALS_SCHEMA: Schema = &[
    FieldRule::email("email", "Email"),
    FieldRule::text("password", "Password"),
];

impl Validated for Credentials {
    const SCHEMA: Schema = CREDENTIALS_SCHEMA;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: 1,
            email: "a@x.com".into(),
            password_hash: "$argon2id$...".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@x.com");
    }

    #[test]
    fn test_credentials_email_is_canonical() {
        let credentials: Credentials =
            serde_json::from_value(serde_json::json!({ "email": "  A@X.com ", "password": " p " }))
                .unwrap();
        assert_eq!(credentials.email, "a@x.com");
        assert_eq!(credentials.password, " p ");
    }
}
