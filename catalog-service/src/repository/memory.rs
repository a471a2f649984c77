//! In-process storage backend
//!
//! All tables live behind one `tokio::sync::RwLock`, so every repository call
//! is atomic: a book's row and its author and category links are written
//! under the same guard, and readers never observe a half-replaced link set.
//! Predicates and orderings are evaluated through [`Record`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::traits::{
    BookRepository, CatalogStore, NameLookup, Repository, RepositoryResult, UserRepository,
};
use crate::models::{
    Author, AuthorDraft, AuthorRef, Book, BookDraft, BookStats, BookSummary, Category,
    CategoryCount, CategoryDraft, CategoryRef, NewUser, Publisher, PublisherCount,
    PublisherDraft, PublisherRef, User,
};
use crate::query::{FilterPredicate, Pagination, Record, SortSpec};

/// Monotonic id source for one table, starting at 1
#[derive(Debug, Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

/// Strictly increasing timestamps so creation order is total
#[derive(Debug, Default)]
struct Clock {
    last: Option<DateTime<Utc>>,
}

impl Clock {
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = match self.last {
            Some(last) if now <= last => last + chrono::Duration::microseconds(1),
            _ => now,
        };
        self.last = Some(now);
        now
    }
}

#[derive(Debug, Clone)]
struct NamedRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AuthorRow {
    id: i64,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct BookRow {
    id: i64,
    title: String,
    description: String,
    year: i32,
    publisher_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Sequences {
    users: Sequence,
    publishers: Sequence,
    categories: Sequence,
    authors: Sequence,
    books: Sequence,
}

#[derive(Debug, Default)]
struct Tables {
    clock: Clock,
    ids: Sequences,
    users: BTreeMap<i64, User>,
    publishers: BTreeMap<i64, NamedRow>,
    categories: BTreeMap<i64, NamedRow>,
    authors: BTreeMap<i64, AuthorRow>,
    books: BTreeMap<i64, BookRow>,
    /// (book_id, author_id)
    book_authors: BTreeSet<(i64, i64)>,
    /// (book_id, category_id)
    book_categories: BTreeSet<(i64, i64)>,
}

type Shared = Arc<RwLock<Tables>>;

impl Tables {
    fn links_of(links: &BTreeSet<(i64, i64)>, book_id: i64) -> impl Iterator<Item = i64> + '_ {
        links
            .range((book_id, i64::MIN)..=(book_id, i64::MAX))
            .map(|(_, other)| *other)
    }

    fn summary(row: &BookRow) -> BookSummary {
        BookSummary {
            id: row.id,
            title: row.title.clone(),
            year: row.year,
            publisher_id: row.publisher_id,
        }
    }

    fn book(&self, row: &BookRow) -> Book {
        Book {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            year: row.year,
            publisher_id: row.publisher_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            publisher: self.publishers.get(&row.publisher_id).map(|p| PublisherRef {
                id: p.id,
                name: p.name.clone(),
            }),
            authors: Self::links_of(&self.book_authors, row.id)
                .filter_map(|id| self.authors.get(&id))
                .map(|a| AuthorRef {
                    id: a.id,
                    first_name: a.first_name.clone(),
                    last_name: a.last_name.clone(),
                })
                .collect(),
            categories: Self::links_of(&self.book_categories, row.id)
                .filter_map(|id| self.categories.get(&id))
                .map(|c| CategoryRef {
                    id: c.id,
                    name: c.name.clone(),
                })
                .collect(),
        }
    }

    fn linked_books(&self, links: &BTreeSet<(i64, i64)>, other_id: i64) -> Vec<BookSummary> {
        links
            .iter()
            .filter(|(_, other)| *other == other_id)
            .filter_map(|(book_id, _)| self.books.get(book_id))
            .map(Self::summary)
            .collect()
    }

    fn author(&self, row: &AuthorRow) -> Author {
        Author {
            id: row.id,
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: self.linked_books(&self.book_authors, row.id),
        }
    }

    fn category(&self, row: &NamedRow) -> Category {
        Category {
            id: row.id,
            name: row.name.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: self.linked_books(&self.book_categories, row.id),
        }
    }

    fn publisher(&self, row: &NamedRow) -> Publisher {
        Publisher {
            id: row.id,
            name: row.name.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: self
                .books
                .values()
                .filter(|b| b.publisher_id == row.id)
                .map(Self::summary)
                .collect(),
        }
    }

    /// Every link target of a draft must exist
    fn check_book_refs(&self, draft: &BookDraft, op: RepositoryOperation) -> RepositoryResult<()> {
        if !self.publishers.contains_key(&draft.publisher_id) {
            return Err(RepositoryError::missing_reference(op, "Publisher", draft.publisher_id));
        }
        if let Some(id) = draft.author_ids.iter().find(|id| !self.authors.contains_key(id)) {
            return Err(RepositoryError::missing_reference(op, "Author", *id));
        }
        if let Some(id) = draft
            .category_ids
            .iter()
            .find(|id| !self.categories.contains_key(id))
        {
            return Err(RepositoryError::missing_reference(op, "Category", *id));
        }
        Ok(())
    }

    fn unlink_book(&mut self, book_id: i64) {
        self.book_authors.retain(|(book, _)| *book != book_id);
        self.book_categories.retain(|(book, _)| *book != book_id);
    }

    fn replace_links(&mut self, book_id: i64, draft: &BookDraft) {
        self.unlink_book(book_id);
        self.book_authors
            .extend(draft.author_ids.iter().map(|author| (book_id, *author)));
        self.book_categories
            .extend(draft.category_ids.iter().map(|category| (book_id, *category)));
    }
}

fn name_taken(rows: &BTreeMap<i64, NamedRow>, name: &str, except: Option<i64>) -> bool {
    rows.values()
        .any(|row| row.name == name && Some(row.id) != except)
}

/// Filter, order and window a set of records
fn page_of<E: Record>(
    records: impl Iterator<Item = E>,
    predicate: &FilterPredicate,
    sort: SortSpec,
    pagination: Pagination,
) -> Vec<E> {
    let mut matched: Vec<E> = records.filter(|r| predicate.matches(r)).collect();
    matched.sort_by(|a, b| sort.compare(a, b));
    matched
        .into_iter()
        .skip(usize::try_from(pagination.offset).unwrap_or(usize::MAX))
        .take(usize::try_from(pagination.limit).unwrap_or(usize::MAX))
        .collect()
}

fn count_of<E: Record>(records: impl Iterator<Item = E>, predicate: &FilterPredicate) -> u64 {
    records.filter(|r| predicate.matches(r)).count() as u64
}

/// In-memory [`CatalogStore`]
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    books: MemoryBooks,
    authors: MemoryAuthors,
    categories: MemoryCategories,
    publishers: MemoryPublishers,
    users: MemoryUsers,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables: Shared = Arc::default();
        Self {
            books: MemoryBooks(tables.clone()),
            authors: MemoryAuthors(tables.clone()),
            categories: MemoryCategories(tables.clone()),
            publishers: MemoryPublishers(tables.clone()),
            users: MemoryUsers(tables),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for MemoryStore {
    type Books = MemoryBooks;
    type Authors = MemoryAuthors;
    type Categories = MemoryCategories;
    type Publishers = MemoryPublishers;
    type Users = MemoryUsers;

    fn books(&self) -> &Self::Books {
        &self.books
    }

    fn authors(&self) -> &Self::Authors {
        &self.authors
    }

    fn categories(&self) -> &Self::Categories {
        &self.categories
    }

    fn publishers(&self) -> &Self::Publishers {
        &self.publishers
    }

    fn users(&self) -> &Self::Users {
        &self.users
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBooks(Shared);

#[derive(Debug, Clone, Default)]
pub struct MemoryAuthors(Shared);

#[derive(Debug, Clone, Default)]
pub struct MemoryCategories(Shared);

#[derive(Debug, Clone, Default)]
pub struct MemoryPublishers(Shared);

#[derive(Debug, Clone, Default)]
pub struct MemoryUsers(Shared);

impl Repository<Book, BookDraft> for MemoryBooks {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>> {
        let tables = self.0.read().await;
        Ok(tables.books.get(&id).map(|row| tables.book(row)))
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Book>> {
        let tables = self.0.read().await;
        let books = tables.books.values().map(|row| tables.book(row));
        Ok(page_of(books, predicate, sort, pagination))
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let tables = self.0.read().await;
        Ok(count_of(tables.books.values().map(|row| tables.book(row)), predicate))
    }

    async fn create(&self, draft: BookDraft) -> RepositoryResult<Book> {
        let draft = draft.dedup_links();
        let mut tables = self.0.write().await;
        tables.check_book_refs(&draft, RepositoryOperation::Create)?;

        let id = tables.ids.books.next();
        let now = tables.clock.now();
        let row = BookRow {
            id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            year: draft.year,
            publisher_id: draft.publisher_id,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(id, row.clone());
        tables.replace_links(id, &draft);
        Ok(tables.book(&row))
    }

    async fn update(&self, id: i64, draft: BookDraft) -> RepositoryResult<Book> {
        let draft = draft.dedup_links();
        let mut tables = self.0.write().await;
        if !tables.books.contains_key(&id) {
            return Err(RepositoryError::not_found("Book", id.to_string())
                .with_operation(RepositoryOperation::Update));
        }
        tables.check_book_refs(&draft, RepositoryOperation::Update)?;

        let now = tables.clock.now();
        let Some(row) = tables.books.get_mut(&id) else {
            return Err(RepositoryError::not_found("Book", id.to_string()));
        };
        row.title = draft.title.clone();
        row.description = draft.description.clone();
        row.year = draft.year;
        row.publisher_id = draft.publisher_id;
        row.updated_at = now;
        let row = row.clone();

        tables.replace_links(id, &draft);
        Ok(tables.book(&row))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tables = self.0.write().await;
        tables.unlink_book(id);
        Ok(tables.books.remove(&id).is_some())
    }
}

impl BookRepository for MemoryBooks {
    async fn stats(&self) -> RepositoryResult<BookStats> {
        let tables = self.0.read().await;
        let years: Vec<i32> = tables.books.values().map(|b| b.year).collect();
        let total_books = years.len() as u64;

        let mut by_category: Vec<CategoryCount> = tables
            .categories
            .values()
            .map(|c| CategoryCount {
                category_id: c.id,
                name: c.name.clone(),
                count: tables
                    .book_categories
                    .iter()
                    .filter(|(_, category)| *category == c.id)
                    .count() as u64,
            })
            .filter(|c| c.count > 0)
            .collect();
        by_category.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        let mut by_publisher: Vec<PublisherCount> = tables
            .publishers
            .values()
            .map(|p| PublisherCount {
                publisher_id: p.id,
                name: p.name.clone(),
                count: tables
                    .books
                    .values()
                    .filter(|b| b.publisher_id == p.id)
                    .count() as u64,
            })
            .filter(|p| p.count > 0)
            .collect();
        by_publisher.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        Ok(BookStats {
            total_books,
            earliest_year: years.iter().copied().min(),
            latest_year: years.iter().copied().max(),
            average_year: (total_books > 0)
                .then(|| years.iter().map(|y| f64::from(*y)).sum::<f64>() / total_books as f64),
            by_category,
            by_publisher,
        })
    }
}

impl Repository<Author, AuthorDraft> for MemoryAuthors {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Author>> {
        let tables = self.0.read().await;
        Ok(tables.authors.get(&id).map(|row| tables.author(row)))
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Author>> {
        let tables = self.0.read().await;
        let authors = tables.authors.values().map(|row| tables.author(row));
        Ok(page_of(authors, predicate, sort, pagination))
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let tables = self.0.read().await;
        Ok(count_of(tables.authors.values().map(|row| tables.author(row)), predicate))
    }

    async fn create(&self, draft: AuthorDraft) -> RepositoryResult<Author> {
        let mut tables = self.0.write().await;
        let id = tables.ids.authors.next();
        let now = tables.clock.now();
        let row = AuthorRow {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            created_at: now,
            updated_at: now,
        };
        tables.authors.insert(id, row.clone());
        Ok(tables.author(&row))
    }

    async fn update(&self, id: i64, draft: AuthorDraft) -> RepositoryResult<Author> {
        let mut tables = self.0.write().await;
        let now = tables.clock.now();
        let Some(row) = tables.authors.get_mut(&id) else {
            return Err(RepositoryError::not_found("Author", id.to_string())
                .with_operation(RepositoryOperation::Update));
        };
        row.first_name = draft.first_name;
        row.last_name = draft.last_name;
        row.updated_at = now;
        let row = row.clone();
        Ok(tables.author(&row))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tables = self.0.write().await;
        tables.book_authors.retain(|(_, author)| *author != id);
        Ok(tables.authors.remove(&id).is_some())
    }
}

impl Repository<Category, CategoryDraft> for MemoryCategories {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        let tables = self.0.read().await;
        Ok(tables.categories.get(&id).map(|row| tables.category(row)))
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Category>> {
        let tables = self.0.read().await;
        let categories = tables.categories.values().map(|row| tables.category(row));
        Ok(page_of(categories, predicate, sort, pagination))
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let tables = self.0.read().await;
        Ok(count_of(
            tables.categories.values().map(|row| tables.category(row)),
            predicate,
        ))
    }

    async fn create(&self, draft: CategoryDraft) -> RepositoryResult<Category> {
        let mut tables = self.0.write().await;
        if name_taken(&tables.categories, &draft.name, None) {
            return Err(RepositoryError::already_exists("Category", draft.name));
        }
        let id = tables.ids.categories.next();
        let now = tables.clock.now();
        let row = NamedRow {
            id,
            name: draft.name,
            created_at: now,
            updated_at: now,
        };
        tables.categories.insert(id, row.clone());
        Ok(tables.category(&row))
    }

    async fn update(&self, id: i64, draft: CategoryDraft) -> RepositoryResult<Category> {
        let mut tables = self.0.write().await;
        if name_taken(&tables.categories, &draft.name, Some(id)) {
            return Err(RepositoryError::already_exists("Category", draft.name)
                .with_operation(RepositoryOperation::Update));
        }
        let now = tables.clock.now();
        let Some(row) = tables.categories.get_mut(&id) else {
            return Err(RepositoryError::not_found("Category", id.to_string())
                .with_operation(RepositoryOperation::Update));
        };
        row.name = draft.name;
        row.updated_at = now;
        let row = row.clone();
        Ok(tables.category(&row))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tables = self.0.write().await;
        tables.book_categories.retain(|(_, category)| *category != id);
        Ok(tables.categories.remove(&id).is_some())
    }
}

impl NameLookup<Category> for MemoryCategories {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Category>> {
        let tables = self.0.read().await;
        Ok(tables
            .categories
            .values()
            .find(|row| row.name == name)
            .map(|row| tables.category(row)))
    }
}

impl Repository<Publisher, PublisherDraft> for MemoryPublishers {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Publisher>> {
        let tables = self.0.read().await;
        Ok(tables.publishers.get(&id).map(|row| tables.publisher(row)))
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Publisher>> {
        let tables = self.0.read().await;
        let publishers = tables.publishers.values().map(|row| tables.publisher(row));
        Ok(page_of(publishers, predicate, sort, pagination))
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let tables = self.0.read().await;
        Ok(count_of(
            tables.publishers.values().map(|row| tables.publisher(row)),
            predicate,
        ))
    }

    async fn create(&self, draft: PublisherDraft) -> RepositoryResult<Publisher> {
        let mut tables = self.0.write().await;
        if name_taken(&tables.publishers, &draft.name, None) {
            return Err(RepositoryError::already_exists("Publisher", draft.name));
        }
        let id = tables.ids.publishers.next();
        let now = tables.clock.now();
        let row = NamedRow {
            id,
            name: draft.name,
            created_at: now,
            updated_at: now,
        };
        tables.publishers.insert(id, row.clone());
        Ok(tables.publisher(&row))
    }

    async fn update(&self, id: i64, draft: PublisherDraft) -> RepositoryResult<Publisher> {
        let mut tables = self.0.write().await;
        if name_taken(&tables.publishers, &draft.name, Some(id)) {
            return Err(RepositoryError::already_exists("Publisher", draft.name)
                .with_operation(RepositoryOperation::Update));
        }
        let now = tables.clock.now();
        let Some(row) = tables.publishers.get_mut(&id) else {
            return Err(RepositoryError::not_found("Publisher", id.to_string())
                .with_operation(RepositoryOperation::Update));
        };
        row.name = draft.name;
        row.updated_at = now;
        let row = row.clone();
        Ok(tables.publisher(&row))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut tables = self.0.write().await;
        if tables.books.values().any(|b| b.publisher_id == id) {
            return Err(RepositoryError::constraint_violation(
                RepositoryOperation::Delete,
                "Publisher still has books and cannot be deleted.",
            )
            .with_entity("Publisher", id.to_string()));
        }
        Ok(tables.publishers.remove(&id).is_some())
    }
}

impl NameLookup<Publisher> for MemoryPublishers {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Publisher>> {
        let tables = self.0.read().await;
        Ok(tables
            .publishers
            .values()
            .find(|row| row.name == name)
            .map(|row| tables.publisher(row)))
    }
}

impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        Ok(self.0.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(self
            .0
            .read()
            .await
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        let mut tables = self.0.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::already_exists("User", user.email));
        }
        let id = tables.ids.users.next();
        let created_at = tables.clock.now();
        let user = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            created_at,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{profile, SortDirection};
    use crate::repository::RepositoryErrorKind;

    async fn fixture() -> MemoryStore {
        let store = MemoryStore::new();
        for name in ["Penguin", "Orbit"] {
            store
                .publishers()
                .create(PublisherDraft { name: name.into() })
                .await
                .unwrap();
        }
        for (first, last) in [("Frank", "Herbert"), ("Ursula", "Le Guin")] {
            store
                .authors()
                .create(AuthorDraft {
                    first_name: first.into(),
                    last_name: last.into(),
                })
                .await
                .unwrap();
        }
        for name in ["Science Fiction", "Fantasy", "Classic"] {
            store
                .categories()
                .create(CategoryDraft { name: name.into() })
                .await
                .unwrap();
        }
        store
    }

    fn draft(title: &str, year: i32, authors: Vec<i64>, categories: Vec<i64>) -> BookDraft {
        BookDraft {
            title: title.into(),
            description: format!("About {title}"),
            year,
            author_ids: authors,
            category_ids: categories,
            publisher_id: 1,
        }
    }

    #[tokio::test]
    async fn test_create_book_with_links() {
        let store = fixture().await;
        let book = store
            .books()
            .create(draft("Dune", 1965, vec![2, 1], vec![3]))
            .await
            .unwrap();

        assert_eq!(book.id, 1);
        let author_ids: Vec<i64> = book.authors.iter().map(|a| a.id).collect();
        assert_eq!(author_ids, vec![1, 2]);
        assert_eq!(book.categories[0].name, "Classic");
        assert_eq!(book.publisher.unwrap().name, "Penguin");

        let author = store.authors().find_by_id(1).await.unwrap().unwrap();
        assert_eq!(author.books.len(), 1);
    }

    #[tokio::test]
    async fn test_update_replaces_links_atomically() {
        let store = fixture().await;
        let book = store
            .books()
            .create(draft("Dune", 1965, vec![1], vec![1, 2]))
            .await
            .unwrap();

        let updated = store
            .books()
            .update(book.id, draft("Dune", 1965, vec![2, 2], vec![3]))
            .await
            .unwrap();
        assert_eq!(updated.authors.len(), 1);
        assert_eq!(updated.authors[0].id, 2);
        assert_eq!(updated.categories.len(), 1);

        let again = store
            .books()
            .update(book.id, draft("Dune", 1965, vec![2, 2], vec![3]))
            .await
            .unwrap();
        assert_eq!(again.authors, updated.authors);
        assert_eq!(again.categories, updated.categories);
    }

    #[tokio::test]
    async fn test_missing_reference_leaves_book_untouched() {
        let store = fixture().await;
        let book = store
            .books()
            .create(draft("Dune", 1965, vec![1], vec![1]))
            .await
            .unwrap();

        let err = store
            .books()
            .update(book.id, draft("Changed", 1970, vec![99], vec![2]))
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConstraintViolation);

        let stored = store.books().find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Dune");
        assert_eq!(stored.authors[0].id, 1);
        assert_eq!(stored.categories[0].id, 1);
    }

    #[tokio::test]
    async fn test_find_all_filters_sorts_and_pages() {
        let store = fixture().await;
        for (title, year) in [("B", 1990), ("A", 1980), ("C", 2000), ("D", 1970)] {
            store
                .books()
                .create(draft(title, year, vec![1], vec![1]))
                .await
                .unwrap();
        }

        let predicate = FilterPredicate::all();
        let sort = SortSpec::new("year", SortDirection::Ascending);
        let page = store
            .books()
            .find_all(&predicate, sort, Pagination::page(2, 2))
            .await
            .unwrap();
        let titles: Vec<&str> = page.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "C"]);

        let newest = store
            .books()
            .find_all(&predicate, profile::BOOKS.default_sort, Pagination::page(1, 1))
            .await
            .unwrap();
        assert_eq!(newest[0].title, "D");

        assert_eq!(store.books().count(&predicate).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let store = fixture().await;
        let err = store
            .categories()
            .create(CategoryDraft {
                name: "Fantasy".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);

        // renaming to its own name is fine
        let same = store
            .categories()
            .update(2, CategoryDraft {
                name: "Fantasy".into(),
            })
            .await
            .unwrap();
        assert_eq!(same.name, "Fantasy");
    }

    #[tokio::test]
    async fn test_delete_removes_links() {
        let store = fixture().await;
        store
            .books()
            .create(draft("Dune", 1965, vec![1], vec![1]))
            .await
            .unwrap();

        assert!(store.books().delete(1).await.unwrap());
        assert!(!store.books().delete(1).await.unwrap());
        let author = store.authors().find_by_id(1).await.unwrap().unwrap();
        assert!(author.books.is_empty());
    }

    #[tokio::test]
    async fn test_publisher_with_books_cannot_be_deleted() {
        let store = fixture().await;
        store
            .books()
            .create(draft("Dune", 1965, vec![1], vec![1]))
            .await
            .unwrap();

        let err = store.publishers().delete(1).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::ConstraintViolation);
        assert!(store.publishers().delete(2).await.unwrap());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = fixture().await;
        let empty = store.books().stats().await.unwrap();
        assert_eq!(empty.total_books, 0);
        assert_eq!(empty.average_year, None);

        store
            .books()
            .create(draft("Dune", 1960, vec![1], vec![1, 2]))
            .await
            .unwrap();
        store
            .books()
            .create(draft("Earthsea", 1970, vec![2], vec![2]))
            .await
            .unwrap();

        let stats = store.books().stats().await.unwrap();
        assert_eq!(stats.total_books, 2);
        assert_eq!(stats.earliest_year, Some(1960));
        assert_eq!(stats.latest_year, Some(1970));
        assert_eq!(stats.average_year, Some(1965.0));
        assert_eq!(stats.by_category[0].name, "Fantasy");
        assert_eq!(stats.by_category[0].count, 2);
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_publisher.len(), 1);
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let store = MemoryStore::new();
        let user = NewUser {
            email: "a@x.com".into(),
            password_hash: "hash".into(),
        };
        let created = store.users().create(user.clone()).await.unwrap();
        assert_eq!(created.id, 1);

        let err = store.users().create(user).await.unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::AlreadyExists);
        assert!(store.users().find_by_email("a@x.com").await.unwrap().is_some());
    }
}
