//! Registration and login

use axum::extract::State;

use super::{conflict_on_duplicate, MessageResponse, Payload, TokenResponse};
use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::models::{Credentials, NewUser};
use crate::repository::{CatalogStore, UserRepository};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;

const USER_EXISTS: &str = "User already exists";

/// Run Argon2 off the async workers
async fn blocking<T, F>(hasher: &PasswordHasher, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&PasswordHasher) -> Result<T> + Send + 'static,
{
    let hasher = hasher.clone();
    tokio::task::spawn_blocking(move || work(&hasher))
        .await
        .map_err(|e| Error::Internal(format!("Password task failed: {e}")))?
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/register",
        tag = "auth",
        operation_id = "register",
        request_body = Credentials,
        responses(
            (status = 201, description = "User created"),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
        )
    )
)]
pub async fn register<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Payload(credentials): Payload<Credentials>,
) -> Result<MessageResponse> {
    let users = state.store().users();
    if users.find_by_email(&credentials.email).await?.is_some() {
        return Err(Error::Conflict(USER_EXISTS.to_string()));
    }

    let password = credentials.password;
    let password_hash = blocking(state.passwords(), move |h| h.hash(&password)).await?;

    let user = users
        .create(NewUser {
            email: credentials.email,
            password_hash,
        })
        .await
        .map_err(conflict_on_duplicate(USER_EXISTS))?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(MessageResponse::message("User created successfully").created())
}

/// Exchange credentials for an access token
///
/// Unknown email and wrong password are indistinguishable to the caller.
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/login",
        tag = "auth",
        operation_id = "login",
        request_body = Credentials,
        responses(
            (status = 200, description = "Access token", body = TokenResponse),
            (status = 400, description = "Invalid credentials", body = ErrorResponse),
        )
    )
)]
pub async fn login<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Payload(credentials): Payload<Credentials>,
) -> Result<TokenResponse> {
    let Some(user) = state.store().users().find_by_email(&credentials.email).await? else {
        tracing::warn!("Login with unknown email");
        return Err(Error::InvalidCredentials);
    };

    let password = credentials.password;
    let stored = user.password_hash.clone();
    let valid = blocking(state.passwords(), move |h| h.verify(&password, &stored)).await?;
    if !valid {
        tracing::warn!(user_id = user.id, "Login with wrong password");
        return Err(Error::InvalidCredentials);
    }

    let token = state.tokens().sign(&user)?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(TokenResponse { token })
}
