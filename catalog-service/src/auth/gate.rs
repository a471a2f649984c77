//! Bearer-token gate for protected routes
//!
//! [`AuthUser`] is an extractor: a handler that lists it as an argument only
//! runs once the token has been verified and its user loaded. The identity is
//! passed explicitly and nothing is written into request extensions.

use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use serde::Serialize;

use crate::error::Error;
use crate::repository::{CatalogStore, UserRepository};
use crate::state::AppState;

/// The authenticated account making the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

/// Token from an `Authorization: Bearer <token>` header
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
    S: CatalogStore,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            tracing::warn!(path = %parts.uri.path(), "Missing or malformed Authorization header");
            return Err(Error::InvalidToken);
        };

        let claims = state.tokens().verify(token).inspect_err(|_| {
            tracing::warn!(path = %parts.uri.path(), "Bearer token failed verification");
        })?;

        let Some(user_id) = claims.user_id() else {
            tracing::warn!(sub = %claims.sub, "Token subject is not a user id");
            return Err(Error::InvalidToken);
        };

        match state.store().users().find_by_id(user_id).await? {
            Some(user) => Ok(Self {
                id: user.id,
                email: user.email,
            }),
            None => {
                tracing::warn!(user_id, "Token refers to a user that no longer exists");
                Err(Error::InvalidToken)
            }
        }
    }
}
