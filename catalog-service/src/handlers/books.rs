//! `/books` handlers
//!
//! Reads are public; writes require a token. Create and update replace the
//! book's author and category links as one storage call.

use axum::extract::State;

use super::{
    list_resource, ItemResponse, ListParams, ListResponse, MessageResponse, Payload, RecordId,
};
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::models::{Book, BookDraft, BookStats};
use crate::query::profile;
use crate::repository::{BookRepository, CatalogStore, Repository};
use crate::state::AppState;

#[cfg(feature = "openapi")]
use crate::{error::ErrorResponse, openapi::ListQueryParams};

const NOT_FOUND: &str = "Book not found.";

async fn find<S: CatalogStore>(state: &AppState<S>, id: i64) -> Result<Book> {
    state
        .store()
        .books()
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound(NOT_FOUND.to_string()))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/books",
        tag = "books",
        operation_id = "list_books",
        params(
            ListQueryParams,
            ("title" = Option<String>, Query, description = "Title contains"),
            ("description" = Option<String>, Query, description = "Description contains"),
            ("year" = Option<i64>, Query, description = "Exact publication year"),
            ("minYear" = Option<i64>, Query, description = "Earliest publication year"),
            ("maxYear" = Option<i64>, Query, description = "Latest publication year"),
            ("publisherId" = Option<i64>, Query, description = "Publisher id"),
            ("author" = Option<String>, Query, description = "Author name contains"),
            ("category" = Option<String>, Query, description = "Category name contains"),
        ),
        responses(
            (status = 200, description = "One page of books", body = ListResponse<Book>),
        )
    )
)]
pub async fn list<S: CatalogStore>(
    State(state): State<AppState<S>>,
    ListParams(raw): ListParams,
) -> Result<ListResponse<Book>> {
    list_resource::<_, Book, BookDraft>(
        state.store().books(),
        &raw,
        &profile::BOOKS,
        state.listing(),
    )
    .await
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/books/{id}",
        tag = "books",
        operation_id = "get_book",
        params(("id" = i64, Path, description = "Book id")),
        responses(
            (status = 200, description = "Book found", body = ItemResponse<Book>),
            (status = 404, description = "Book not found", body = ErrorResponse),
        )
    )
)]
pub async fn get<S: CatalogStore>(
    State(state): State<AppState<S>>,
    RecordId(id): RecordId,
) -> Result<ItemResponse<Book>> {
    find(&state, id).await.map(ItemResponse::new)
}

/// Catalog-wide figures
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/books/stats",
        tag = "books",
        operation_id = "book_stats",
        responses(
            (status = 200, description = "Catalog-wide figures", body = ItemResponse<BookStats>),
        )
    )
)]
pub async fn stats<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> Result<ItemResponse<BookStats>> {
    let stats = state.store().books().stats().await?;
    Ok(ItemResponse::new(stats))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/books",
        tag = "books",
        operation_id = "create_book",
        request_body = BookDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 201, description = "Book created", body = MessageResponse<Book>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        )
    )
)]
pub async fn create<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    Payload(draft): Payload<BookDraft>,
) -> Result<MessageResponse<Book>> {
    let book = state.store().books().create(draft).await?;
    tracing::info!(user_id = user.id, book_id = book.id, "Book created");
    Ok(MessageResponse::with_data("Book created successfully.", book).created())
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        put,
        path = "/books/{id}",
        tag = "books",
        operation_id = "update_book",
        params(("id" = i64, Path, description = "Book id")),
        request_body = BookDraft,
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Book updated", body = MessageResponse<Book>),
            (status = 400, description = "Invalid payload or duplicate", body = ErrorResponse),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Book not found", body = ErrorResponse),
        )
    )
)]
pub async fn update<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
    Payload(draft): Payload<BookDraft>,
) -> Result<MessageResponse<Book>> {
    find(&state, id).await?;
    let book = state.store().books().update(id, draft).await?;
    tracing::info!(user_id = user.id, book_id = id, "Book updated");
    Ok(MessageResponse::with_data("Book updated successfully.", book))
}

#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        delete,
        path = "/books/{id}",
        tag = "books",
        operation_id = "delete_book",
        params(("id" = i64, Path, description = "Book id")),
        security(("bearerAuth" = [])),
        responses(
            (status = 200, description = "Book deleted"),
            (status = 401, description = "Missing or invalid token", body = ErrorResponse),
            (status = 404, description = "Book not found", body = ErrorResponse),
        )
    )
)]
pub async fn delete<S: CatalogStore>(
    State(state): State<AppState<S>>,
    user: AuthUser,
    RecordId(id): RecordId,
) -> Result<MessageResponse> {
    find(&state, id).await?;
    if !state.store().books().delete(id).await? {
        return Err(Error::NotFound(NOT_FOUND.to_string()));
    }
    tracing::info!(user_id = user.id, book_id = id, "Book deleted");
    Ok(MessageResponse::message("Book deleted successfully."))
}
