//! `/publishers` handlers

use axum::extract::State;

use super::{
    conflict_on_duplicate, list_resource, ItemResponse, ListParams, ListResponse,
    MessageResponse, Payload, RecordId,
};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{Publisher, PublisherDraft};
use crate::query::profile;
use crate::repository::{CatalogStore, NameLookup, Repository};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::{error::ErrorResponse, openapi::ListQueryParams};

const NOT_FOUND: &str = "Publisher not found.";
pub(crate) const NAME_TAKEN: &str = "Publisher with this name already exists.";

async fn find<S: CatalogStore>(state: &AppState<S>, id: i64) -> Result<Publisher> {
    state
        .store()
        .publishers()
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
}

async fn ensure_name_free<S: CatalogStore>(
    state: &AppState<S>,
    name: &str,
    except: Option<i64>,
) -> Result<()> {
    match state.store().publishers().find_by_name(name).await? {
        Some(existing) if Some(existing.id) != except => Err(Error::Conflict(NAME_TAKEN.to_string())),
        _ => Ok(()),
    }
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/publishers",
        tag = "publishers",
        operation_id = "list_publishers",
        params(
            ListQueryParams,
            ("name" = Option<String>, Query, description = "Name contains"),
        ),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "One page of publishers", body = ListResponse<Publisher>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn list<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    ListParams(raw): ListParams,
) -> Result<ListResponse<Publisher>> {
    list_resource::<_, Publisher, PublisherDraft>(
        state.store().publishers(),
        &raw,
        &profile::PUBLISHERS,
        state.listing(),
    )
    .await
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/publishers/{id}",
        tag = "publishers",
        operation_id = "get_publisher",
        params(("id" = i64, Path, description = "Publisher id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Publisher found", body = ItemResponse<Publisher>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Publisher not found", body = ErrorResponse),
        )
    )
)]
pub async fn get<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    RecordId(id): RecordId,
) -> Result<ItemResponse<Publisher>> {
    find(&state, id).await.map(ItemResponse::new)
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/publishers",
        tag = "publishers",
        operation_id = "create_publisher",
        request_body = PublisherDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 201, description = "Publisher created", body = MessageResponse<Publisher>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn create<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Payload(draft): Payload<PublisherDraft>,
) -> Result<MessageResponse<Publisher>> {
    ensure_name_free(&state, &draft.name, None).await?;
    let publisher = state
        .store()
        .publishers()
        .create(draft)
        .await
        .map_err(conflict_on_duplicate(NAME_TAKEN))?;
    tracing::info!(user_id = user.id, publisher_id = publisher.id, "Publisher created");
    Ok(MessageResponse::with_data("Publisher created successfully.", publisher).created())
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        put,
        path = "/publishers/{id}",
        tag = "publishers",
        operation_id = "update_publisher",
        params(("id" = i64, Path, description = "Publisher id")),
        request_body = PublisherDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Publisher updated", body = MessageResponse<Publisher>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Publisher not found", body = ErrorResponse),
        )
    )
)]
pub async fn update<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
    Payload(draft): Payload<PublisherDraft>,
) -> Result<MessageResponse<Publisher>> {
    find(&state, id).await?;
    ensure_name_free(&state, &draft.name, Some(id)).await?;
    let publisher = state
        .store()
        .publishers()
        .update(id, draft)
        .await
        .map_err(conflict_on_duplicate(NAME_TAKEN))?;
    tracing::info!(user_id = user.id, publisher_id = id, "Publisher updated");
    Ok(MessageResponse::with_data("Publisher updated successfully.", publisher))
}

/// Refused with 400 while books still reference the publisher
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        delete,
        path = "/publishers/{id}",
        tag = "publishers",
        operation_id = "delete_publisher",
        params(("id" = i64, Path, description = "Publisher id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Publisher deleted"),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Publisher not found", body = ErrorResponse),
        )
    )
)]
pub async fn delete<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<MessageResponse> {
    find(&state, id).await?;
    if !state.store().publishers().delete(id).await? {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(user_id = user.id, publisher_id = id, "Publisher deleted");
    Ok(MessageResponse::message("Publisher deleted successfully."))
}
