//! `/authors` handlers

use axum::extract::State;

use super::{
    list_resource, ItemResponse, ListParams, ListResponse, MessageResponse, Payload, RecordId,
};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{Author, AuthorDraft};
use crate::query::profile;
use crate::repository::{CatalogStore, Repository};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::{error::ErrorResponse, openapi::ListQueryParams};

const NOT_FOUND: &str = "Author not found.";

async fn find<S: CatalogStore>(state: &AppState<S>, id: i64) -> Result<Author> {
    state
        .store()
        .authors()
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/authors",
        tag = "authors",
        operation_id = "list_authors",
        params(
            ListQueryParams,
            ("first_name" = Option<String>, Query, description = "First name contains"),
            ("last_name" = Option<String>, Query, description = "Last name contains"),
        ),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "One page of authors", body = ListResponse<Author>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn list<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    ListParams(raw): ListParams,
) -> Result<ListResponse<Author>> {
    list_resource::<_, Author, AuthorDraft>(
        state.store().authors(),
        &raw,
        &profile::AUTHORS,
        state.listing(),
    )
    .await
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/authors/{id}",
        tag = "authors",
        operation_id = "get_author",
        params(("id" = i64, Path, description = "Author id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Author found", body = ItemResponse<Author>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Author not found", body = ErrorResponse),
        )
    )
)]
pub async fn get<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    RecordId(id): RecordId,
) -> Result<ItemResponse<Author>> {
    find(&state, id).await.map(ItemResponse::new)
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/authors",
        tag = "authors",
        operation_id = "create_author",
        request_body = AuthorDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 201, description = "Author created", body = MessageResponse<Author>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn create<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Payload(draft): Payload<AuthorDraft>,
) -> Result<MessageResponse<Author>> {
    let author = state.store().authors().create(draft).await?;
    tracing::info!(user_id = user.id, author_id = author.id, "Author created");
    Ok(MessageResponse::with_data("Author created successfully.", author).created())
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        put,
        path = "/authors/{id}",
        tag = "authors",
        operation_id = "update_author",
        params(("id" = i64, Path, description = "Author id")),
        request_body = AuthorDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Author updated", body = MessageResponse<Author>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Author not found", body = ErrorResponse),
        )
    )
)]
pub async fn update<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
    Payload(draft): Payload<AuthorDraft>,
) -> Result<MessageResponse<Author>> {
    find(&state, id).await?;
    let author = state.store().authors().update(id, draft).await?;
    tracing::info!(user_id = user.id, author_id = id, "Author updated");
    Ok(MessageResponse::with_data("Author updated successfully.", author))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        delete,
        path = "/authors/{id}",
        tag = "authors",
        operation_id = "delete_author",
        params(("id" = i64, Path, description = "Author id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Author deleted"),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Author not found", body = ErrorResponse),
        )
    )
)]
pub async fn delete<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<MessageResponse> {
    find(&state, id).await?;
    if !state.store().authors().delete(id).await? {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(user_id = user.id, author_id = id, "Author deleted");
    Ok(MessageResponse::message("Author deleted successfully."))
}
