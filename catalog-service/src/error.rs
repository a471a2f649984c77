//! Error types and HTTP response conversion

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Result type alias using the service Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Field name to message map reported by validation failures
pub type FieldErrors = BTreeMap<String, String>;

/// Service error taxonomy
///
/// Every variant maps to exactly one HTTP status. Handlers return these
/// directly; collaborator failures convert through the `From` impls below.
#[derive(Debug, Error)]
pub enum Error {
    /// Request body failed field rules (400)
    #[error("Validation failed: {errors:?}")]
    Validation {
        /// First failing rule message per field
        errors: FieldErrors,
    },

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness conflict (400)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Login with unknown email or wrong password (401)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed, expired or orphaned bearer token (401)
    #[error("Invalid token")]
    InvalidToken,

    /// Malformed request that is not a field rule failure (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Storage collaborator failure
    #[error("{0}")]
    Repository(RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error, details are logged and never sent
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    /// Validation error for a single field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        Self::Validation { errors }
    }

    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Conflict(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Repository(e) => match e.kind {
                RepositoryErrorKind::NotFound => StatusCode::NOT_FOUND,
                RepositoryErrorKind::AlreadyExists | RepositoryErrorKind::ConstraintViolation => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    /// Human-readable message
    pub message: String,

    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}

const INTERNAL_MESSAGE: &str = "Something went wrong";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Error::Validation { errors } => ErrorResponse {
                message: "Validation failed".to_string(),
                errors: Some(errors),
            },
            Error::NotFound(message) | Error::Conflict(message) | Error::BadRequest(message) => {
                ErrorResponse::new(message)
            }
            Error::InvalidCredentials => ErrorResponse::new("Invalid credentials"),
            Error::InvalidToken => ErrorResponse::new("Invalid token"),
            Error::Repository(e) => {
                tracing::error!(
                    operation = %e.operation,
                    kind = %e.kind,
                    entity_type = ?e.entity_type,
                    entity_id = ?e.entity_id,
                    "Repository error: {}", e.message
                );
                if status.is_server_error() {
                    ErrorResponse::new(INTERNAL_MESSAGE)
                } else {
                    ErrorResponse::new(e.message)
                }
            }
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                ErrorResponse::new(INTERNAL_MESSAGE)
            }
            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                ErrorResponse::new(INTERNAL_MESSAGE)
            }
            Error::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::new(INTERNAL_MESSAGE)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Internal(format!("token signing failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_body() {
        let (status, body) = body_json(Error::field("title", "Title is required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["title"], "Title is required");
    }

    #[tokio::test]
    async fn test_auth_error_bodies() {
        let (status, body) = body_json(Error::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
        assert!(body.get("errors").is_none());

        let (status, body) = body_json(Error::InvalidToken).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let (status, body) = body_json(Error::Internal("pool exhausted".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went wrong");

        let repo = RepositoryError::database_error(RepositoryOperation::FindAll, "syntax error");
        let (status, body) = body_json(repo.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Something went wrong");
    }

    #[tokio::test]
    async fn test_constraint_violation_is_client_error() {
        let repo = RepositoryError::constraint_violation(
            RepositoryOperation::Create,
            "Author 99 does not exist",
        );
        let (status, body) = body_json(repo.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Author 99 does not exist");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::NotFound("Book not found.".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Conflict("User already exists".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
