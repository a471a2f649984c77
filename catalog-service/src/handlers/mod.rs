//! HTTP handlers and the route table
//!
//! Every collection endpoint lists through [`list_resource`], which applies
//! the shared list-query pipeline with the resource's [`QueryProfile`].
//! Mutating routes, and every route outside `/books` reads, take an
//! [`AuthUser`](crate::auth::AuthUser) argument and so require a valid
//! bearer token.

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod extract;
pub mod health;
pub mod publishers;
pub mod response;

pub use extract::{ListParams, Payload, RecordId};
pub use response::{ItemResponse, ListResponse, MessageResponse, TokenResponse};

use axum::routing::{get, post};
use axum::Router;

use crate::config::ListingConfig;
use crate::error::{Error, Result};
use crate::query::{ListQuery, QueryProfile, RawQuery};
use crate::repository::{CatalogStore, Repository, RepositoryError, RepositoryErrorKind};
use crate::state::AppState;

/// Run one list request against a repository
///
/// Fetches the page and the total concurrently and wraps both in the
/// `{ data, meta }` envelope.
pub async fn list_resource<R, E, D>(
    repository: &R,
    raw: &RawQuery,
    profile: &QueryProfile,
    listing: &ListingConfig,
) -> Result<ListResponse<E>>
where
    R: Repository<E, D>,
{
    let query = ListQuery::build(raw, profile, listing);
    let (data, total) = tokio::try_join!(
        repository.find_all(&query.predicate, query.sort(), query.pagination()),
        repository.count(&query.predicate),
    )?;
    Ok(ListResponse::new(data, query.meta(total)))
}

/// Map a uniqueness failure from storage to a conflict with `message`
///
/// Covers writes that pass the up-front name check but lose a race to a
/// concurrent insert.
pub fn conflict_on_duplicate(message: &'static str) -> impl Fn(RepositoryError) -> Error {
    move |e| match e.kind {
        RepositoryErrorKind::AlreadyExists => Error::Conflict(message.to_string()),
        _ => e.into(),
    }
}

/// All catalog routes, without middleware
pub fn routes<S>() -> Router<AppState<S>>
where
    S: CatalogStore,
{
    Router::new()
        .route("/health", get(health::health::<S>))
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>))
        .route("/books", get(books::list::<S>).post(books::create::<S>))
        .route("/books/stats", get(books::stats::<S>))
        .route(
            "/books/{id}",
            get(books::get::<S>)
                .put(books::update::<S>)
                .delete(books::delete::<S>),
        )
        .route("/authors", get(authors::list::<S>).post(authors::create::<S>))
        .route(
            "/authors/{id}",
            get(authors::get::<S>)
                .put(authors::update::<S>)
                .delete(authors::delete::<S>),
        )
        .route(
            "/categories",
            get(categories::list::<S>).post(categories::create::<S>),
        )
        .route(
            "/categories/{id}",
            get(categories::get::<S>)
                .put(categories::update::<S>)
                .delete(categories::delete::<S>),
        )
        .route(
            "/publishers",
            get(publishers::list::<S>).post(publishers::create::<S>),
        )
        .route(
            "/publishers/{id}",
            get(publishers::get::<S>)
                .put(publishers::update::<S>)
                .delete(publishers::delete::<S>),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryDraft, PublisherDraft};
    use crate::repository::MemoryStore;

    #[tokio::test]
    async fn test_duplicate_name_from_storage_becomes_conflict() {
        let store = MemoryStore::new();
        let draft = CategoryDraft {
            name: "Poetry".to_string(),
        };
        store.categories().create(draft.clone()).await.unwrap();

        let error = store
            .categories()
            .create(draft)
            .await
            .map_err(conflict_on_duplicate(categories::NAME_TAKEN))
            .unwrap_err();
        assert!(
            matches!(&error, Error::Conflict(message) if message.as_str() == "Category with this name already exists.")
        );
    }

    #[tokio::test]
    async fn test_duplicate_rename_from_storage_becomes_conflict() {
        let store = MemoryStore::new();
        let publishers = store.publishers();
        publishers
            .create(PublisherDraft {
                name: "Tor".to_string(),
            })
            .await
            .unwrap();
        let other = publishers
            .create(PublisherDraft {
                name: "Ace".to_string(),
            })
            .await
            .unwrap();

        let error = publishers
            .update(
                other.id,
                PublisherDraft {
                    name: "Tor".to_string(),
                },
            )
            .await
            .map_err(conflict_on_duplicate(publishers::NAME_TAKEN))
            .unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(
            matches!(&error, Error::Conflict(message) if message.as_str() == "Publisher with this name already exists.")
        );
    }

    #[tokio::test]
    async fn test_other_storage_errors_pass_through() {
        let store = MemoryStore::new();
        let error = store
            .categories()
            .update(
                7,
                CategoryDraft {
                    name: "Drama".to_string(),
                },
            )
            .await
            .map_err(conflict_on_duplicate(categories::NAME_TAKEN))
            .unwrap_err();
        assert!(matches!(error, Error::Repository(_)));
    }
}
