//! # catalog-service
//!
//! REST backend for a catalog of books, authors, categories and publishers.
//!
//! ## Features
//!
//! - **List queries**: one parametrized builder for paging, sorting, filtering and search on every collection
//! - **CRUD**: books with author/category links, authors, categories, publishers
//! - **Auth**: Argon2id password hashing and HS256 bearer tokens, resolved by an axum extractor
//! - **Storage**: in-memory by default, PostgreSQL behind the `database` feature
//! - **API docs**: OpenAPI document and Swagger UI at `/api-docs` behind the `openapi` feature
//! - **Middleware stack**: request tracking, security headers, panic recovery, body size limits
//! - **Graceful shutdown**: Proper signal handling (SIGTERM, SIGINT)
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_service::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = AppState::new(config.clone(), MemoryStore::new())?;
//!
//!     Server::new(config).serve(app(state)).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod query;
pub mod repository;
pub mod seed;
pub mod server;
pub mod state;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auth::{AuthUser, Claims, PasswordHasher, TokenIssuer};
    pub use crate::config::{Config, DatabaseConfig, ListingConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::{Author, Book, BookStats, Category, Publisher, User};
    pub use crate::observability::init_tracing;
    pub use crate::query::{ListQuery, PageMeta, QueryProfile, SortSpec};
    pub use crate::repository::{
        CatalogStore, MemoryStore, Repository, RepositoryError, RepositoryErrorKind,
    };
    pub use crate::seed::seed_demo_data;
    pub use crate::server::{app, Server};
    pub use crate::state::AppState;

    #[cfg(feature = "database")]
    pub use crate::repository::PgStore;
}
