//! Request extractors with the service's error bodies
//!
//! axum's own rejections answer in plain text; these wrap them so every
//! failure reaches the client as an [`Error`] JSON body.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde_json::Value;

use crate::error::Error;
use crate::query::RawQuery;
use crate::validation::{check, Validated};

/// A JSON body that passed its schema
///
/// The body is parsed as JSON, checked field by field against
/// `T::SCHEMA`, and only then deserialized into `T`.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: Validated,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

        check(T::SCHEMA, &body).map_err(|errors| Error::Validation { errors })?;

        serde_json::from_value(body)
            .map(Payload)
            .map_err(|e| Error::BadRequest(format!("Invalid request body: {e}")))
    }
}

/// Positive numeric `{id}` path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId(pub i64);

impl<S> FromRequestParts<S> for RecordId
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

        raw.parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map(RecordId)
            .ok_or_else(|| Error::field("id", "ID must be a positive integer"))
    }
}

/// Raw query string parameters for list endpoints
#[derive(Debug, Clone, Default)]
pub struct ListParams(pub RawQuery);

impl<S> FromRequestParts<S> for ListParams
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<RawQuery>::from_request_parts(parts, state)
            .await
            .map(|Query(raw)| ListParams(raw))
            .map_err(|rejection| Error::BadRequest(rejection.body_text()))
    }
}
