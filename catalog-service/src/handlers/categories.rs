//! `/categories` handlers
//!
//! Names are unique; a clash answers 400 before storage is touched.

use axum::extract::State;

use super::{
    conflict_on_duplicate, list_resource, ItemResponse, ListParams, ListResponse,
    MessageResponse, Payload, RecordId,
};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryDraft};
use crate::query::profile;
use crate::repository::{CatalogStore, NameLookup, Repository};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::{error::ErrorResponse, openapi::ListQueryParams};

const NOT_FOUND: &str = "Category not found.";
pub(crate) const NAME_TAKEN: &str = "Category with this name already exists.";

async fn find<S: CatalogStore>(state: &AppState<S>, id: i64) -> Result<Category> {
    state
        .store()
        .categories()
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
}

/// Conflict when another category already uses `name`
async fn ensure_name_free<S: CatalogStore>(
    state: &AppState<S>,
    name: &str,
    except: Option<i64>,
) -> Result<()> {
    match state.store().categories().find_by_name(name).await? {
        Some(existing) if Some(existing.id) != except => Err(Error::Conflict(NAME_TAKEN.to_string())),
        _ => Ok(()),
    }
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/categories",
        tag = "categories",
        operation_id = "list_categories",
        params(
            ListQueryParams,
            ("name" = Option<String>, Query, description = "Name contains"),
        ),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "One page of categories", body = ListResponse<Category>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn list<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    ListParams(raw): ListParams,
) -> Result<ListResponse<Category>> {
    list_resource::<_, Category, CategoryDraft>(
        state.store().categories(),
        &raw,
        &profile::CATEGORIES,
        state.listing(),
    )
    .await
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/categories/{id}",
        tag = "categories",
        operation_id = "get_category",
        params(("id" = i64, Path, description = "Category id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Category found", body = ItemResponse<Category>),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Category not found", body = ErrorResponse),
        )
    )
)]
pub async fn get<S: CatalogStore>(
    State(state): State<AppState<S>>,
    _user: AuthUser,
    RecordId(id): RecordId,
) -> Result<ItemResponse<Category>> {
    find(&state, id).await.map(ItemResponse::new)
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/categories",
        tag = "categories",
        operation_id = "create_category",
        request_body = CategoryDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 201, description = "Category created", body = MessageResponse<Category>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn create<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Payload(draft): Payload<CategoryDraft>,
) -> Result<MessageResponse<Category>> {
    ensure_name_free(&state, &draft.name, None).await?;
    let category = state
        .store()
        .categories()
        .create(draft)
        .await
        .map_err(conflict_on_duplicate(NAME_TAKEN))?;
    tracing::info!(user_id = user.id, category_id = category.id, "Category created");
    Ok(MessageResponse::with_data("Category created successfully.", category).created())
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        put,
        path = "/categories/{id}",
        tag = "categories",
        operation_id = "update_category",
        params(("id" = i64, Path, description = "Category id")),
        request_body = CategoryDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Category updated", body = MessageResponse<Category>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Category not found", body = ErrorResponse),
        )
    )
)]
pub async fn update<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
    Payload(draft): Payload<CategoryDraft>,
) -> Result<MessageResponse<Category>> {
    find(&state, id).await?;
    ensure_name_free(&state, &draft.name, Some(id)).await?;
    let category = state
        .store()
        .categories()
        .update(id, draft)
        .await
        .map_err(conflict_on_duplicate(NAME_TAKEN))?;
    tracing::info!(user_id = user.id, category_id = id, "Category updated");
    Ok(MessageResponse::with_data("Category updated successfully.", category))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        delete,
        path = "/categories/{id}",
        tag = "categories",
        operation_id = "delete_category",
        params(("id" = i64, Path, description = "Category id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Category deleted"),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Category not found", body = ErrorResponse),
        )
    )
)]
pub async fn delete<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<MessageResponse> {
    find(&state, id).await?;
    if !state.store().categories().delete(id).await? {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(user_id = user.id, category_id = id, "Category deleted");
    Ok(MessageResponse::message("Category deleted successfully."))
}
