//! Repository trait definitions
//!
//! Storage is reached through one repository per entity, each using RPITIT
//! (Return Position Impl Trait In Traits) for async methods without
//! `async_trait`. A [`CatalogStore`] bundles the five repositories so handlers
//! can be generic over a single storage type.
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_service::query::{FilterPredicate, Pagination, profile};
//! use catalog_service::repository::{CatalogStore, Repository};
//!
//! async fn newest<S: CatalogStore>(store: &S) -> RepositoryResult<Vec<Book>> {
//!     store
//!         .books()
//!         .find_all(&FilterPredicate::all(), profile::BOOKS.default_sort, Pagination::page(1, 5))
//!         .await
//! }
//! ```

use std::future::Future;

use super::error::RepositoryError;
use crate::models::{
    Author, AuthorDraft, Book, BookDraft, BookStats, Category, CategoryDraft, NewUser, Publisher,
    PublisherDraft, User,
};
use crate::query::{FilterPredicate, Pagination, SortSpec};

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Base repository trait for CRUD operations
///
/// # Type Parameters
///
/// - `Entity`: The full entity type returned from queries, relations included
/// - `Draft`: The payload used for both create and full update
pub trait Repository<Entity, Draft>: Send + Sync {
    /// Find an entity by its identifier
    ///
    /// Returns `Ok(None)` if not found.
    fn find_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Find one page of entities matching `predicate`, ordered by `sort`
    ///
    /// Ties in the sort field are broken by ascending id.
    fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    /// Count entities matching `predicate`
    fn count(&self, predicate: &FilterPredicate)
        -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Create a new entity
    ///
    /// Returns the created entity with generated id and timestamps.
    fn create(&self, draft: Draft) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Replace an existing entity's fields
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` with `NotFound` kind if the entity doesn't exist.
    fn update(&self, id: i64, draft: Draft)
        -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Delete an entity by its identifier
    ///
    /// Returns `true` if the entity was deleted, `false` if it didn't exist.
    fn delete(&self, id: i64) -> impl Future<Output = RepositoryResult<bool>> + Send;
}

/// Lookup by a unique name column
pub trait NameLookup<Entity>: Send + Sync {
    /// Find the entity whose name equals `name` exactly
    fn find_by_name(&self, name: &str)
        -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;
}

/// Book storage
///
/// `create`, `update` and `delete` replace or remove the book's author and
/// category links in the same atomic unit as the book row.
pub trait BookRepository: Repository<Book, BookDraft> {
    /// Aggregate figures over all books
    fn stats(&self) -> impl Future<Output = RepositoryResult<BookStats>> + Send;
}

/// Account storage
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: i64) -> impl Future<Output = RepositoryResult<Option<User>>> + Send;

    fn find_by_email(&self, email: &str)
        -> impl Future<Output = RepositoryResult<Option<User>>> + Send;

    /// Insert a user; fails with `AlreadyExists` on a duplicate email
    fn create(&self, user: NewUser) -> impl Future<Output = RepositoryResult<User>> + Send;
}

/// All repositories of one storage backend
pub trait CatalogStore: Clone + Send + Sync + 'static {
    type Books: BookRepository;
    type Authors: Repository<Author, AuthorDraft>;
    type Categories: Repository<Category, CategoryDraft> + NameLookup<Category>;
    type Publishers: Repository<Publisher, PublisherDraft> + NameLookup<Publisher>;
    type Users: UserRepository;

    fn books(&self) -> &Self::Books;
    fn authors(&self) -> &Self::Authors;
    fn categories(&self) -> &Self::Categories;
    fn publishers(&self) -> &Self::Publishers;
    fn users(&self) -> &Self::Users;
}
