//! Storage collaborators
//!
//! Handlers depend only on the traits in [`traits`]. Two backends implement
//! them:
//!
//! - [`MemoryStore`], always available, used by tests and by default
//! - `PgStore`, PostgreSQL through sqlx, behind the `database` feature

pub mod error;
pub mod memory;
#[cfg(feature = "database")]
pub mod postgres;
pub mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::MemoryStore;
#[cfg(feature = "database")]
pub use postgres::PgStore;
pub use traits::{
    BookRepository, CatalogStore, NameLookup, Repository, RepositoryResult, UserRepository,
};
