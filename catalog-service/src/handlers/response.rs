//! Response envelopes
//!
//! List endpoints answer `{ data, meta }`, single reads `{ data }`, and
//! writes `{ message, data? }`.
//!
//! # Example
//!
//! ```rust
//! use catalog_service::handlers::ListResponse;
//! use catalog_service::query::PageMeta;
//!
//! let response = ListResponse::new(vec!["a", "b"], PageMeta::new(1, 2, 5));
//! let json = serde_json::to_value(&response).unwrap();
//! assert_eq!(json["meta"]["totalPages"], 3);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::query::PageMeta;

/// One page of records with navigation metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, meta: PageMeta) -> Self {
        Self { data, meta }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Single record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ItemResponse<T> {
    pub data: T,
}

impl<T> ItemResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ItemResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Confirmation message, optionally with the affected record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MessageResponse<T = ()> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip)]
    status: StatusCode,
}

impl MessageResponse {
    /// A bare `{ message }` body with 200
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
            status: StatusCode::OK,
        }
    }
}

impl<T> MessageResponse<T> {
    /// `{ message, data }` with 200
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            status: StatusCode::OK,
        }
    }

    /// Answer with 201 instead of 200
    #[must_use]
    pub fn created(mut self) -> Self {
        self.status = StatusCode::CREATED;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for MessageResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Login answer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    pub token: String,
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shapes() {
        let bare = serde_json::to_value(MessageResponse::message("Book deleted successfully.")).unwrap();
        assert_eq!(bare, serde_json::json!({ "message": "Book deleted successfully." }));

        let created = MessageResponse::with_data("Book created successfully.", 42).created();
        assert_eq!(created.status(), StatusCode::CREATED);
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["data"], 42);
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_list_shape() {
        let json = serde_json::to_value(ListResponse::new(vec![1, 2], PageMeta::new(1, 2, 2))).unwrap();
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["hasNext"], false);
    }
}
