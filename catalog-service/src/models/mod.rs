//! Catalog entities, their write payloads and request body schemas

pub mod author;
pub mod book;
pub mod category;
pub mod publisher;
pub mod user;

pub use author::{Author, AuthorDraft, AuthorRef, AUTHOR_SCHEMA};
pub use book::{
    Book, BookDraft, BookStats, BookSummary, CategoryCount, PublisherCount, BOOK_SCHEMA,
};
pub use category::{Category, CategoryDraft, CategoryRef, CATEGORY_SCHEMA};
pub use publisher::{Publisher, PublisherDraft, PublisherRef, PUBLISHER_SCHEMA};
pub use user::{Credentials, NewUser, User, CREDENTIALS_SCHEMA};
