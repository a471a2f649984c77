//! PostgreSQL storage backend
//!
//! List queries are assembled with [`sqlx::QueryBuilder`]: every value is
//! bound, and column names come only from the static tables below, so a
//! predicate can never inject SQL. Book writes run in a transaction covering
//! the book row and both link tables.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};

use super::error::{from_sqlx, RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::traits::{
    BookRepository, CatalogStore, NameLookup, Repository, RepositoryResult, UserRepository,
};
use crate::config::DatabaseConfig;
use crate::models::{
    Author, AuthorDraft, AuthorRef, Book, BookDraft, BookStats, BookSummary, Category,
    CategoryCount, CategoryDraft, CategoryRef, NewUser, Publisher, PublisherCount,
    PublisherDraft, PublisherRef, User,
};
use crate::query::{
    FilterCondition, FilterOperator, FilterPredicate, FilterValue, Pagination, SortSpec,
};

/// Columns ordered case-insensitively
const TEXT_COLUMNS: &[&str] = &["title", "description", "first_name", "last_name", "name"];

/// Filterable and sortable columns of one table
struct Table {
    name: &'static str,
    select: &'static str,
    columns: &'static [&'static str],
}

impl Table {
    fn column(&self, field: &str) -> Option<&'static str> {
        self.columns.iter().copied().find(|c| *c == field)
    }
}

const BOOKS: Table = Table {
    name: "books",
    select: "SELECT books.id, books.title, books.description, books.year, books.publisher_id, \
             books.created_at, books.updated_at, publishers.name AS publisher_name \
             FROM books LEFT JOIN publishers ON publishers.id = books.publisher_id",
    columns: &["id", "title", "description", "year", "publisher_id", "created_at", "updated_at"],
};

const AUTHORS: Table = Table {
    name: "authors",
    select: "SELECT authors.id, authors.first_name, authors.last_name, authors.created_at, \
             authors.updated_at FROM authors",
    columns: &["id", "first_name", "last_name", "created_at", "updated_at"],
};

const CATEGORIES: Table = Table {
    name: "categories",
    select: "SELECT categories.id, categories.name, categories.created_at, categories.updated_at \
             FROM categories",
    columns: &["id", "name", "created_at", "updated_at"],
};

const PUBLISHERS: Table = Table {
    name: "publishers",
    select: "SELECT publishers.id, publishers.name, publishers.created_at, publishers.updated_at \
             FROM publishers",
    columns: &["id", "name", "created_at", "updated_at"],
};

/// Subqueries for book conditions on linked rows
const AUTHOR_NAME_EXISTS: &str = "EXISTS (SELECT 1 FROM book_authors ba \
     JOIN authors a ON a.id = ba.author_id \
     WHERE ba.book_id = books.id AND (a.first_name || ' ' || a.last_name)";
const CATEGORY_NAME_EXISTS: &str = "EXISTS (SELECT 1 FROM book_categories bc \
     JOIN categories c ON c.id = bc.category_id \
     WHERE bc.book_id = books.id AND c.name";

/// `%term%` with LIKE metacharacters escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn push_comparison(qb: &mut QueryBuilder<'_, Postgres>, operator: FilterOperator, value: &FilterValue) {
    match (operator, value) {
        (FilterOperator::Contains, FilterValue::Text(term)) => {
            qb.push(" ILIKE ").push_bind(like_pattern(term));
        }
        (FilterOperator::Equal, FilterValue::Text(term)) => {
            qb.push(" = ").push_bind(term.clone());
        }
        (FilterOperator::Equal | FilterOperator::Contains, FilterValue::Integer(n)) => {
            qb.push(" = ").push_bind(*n);
        }
        (FilterOperator::AtLeast, FilterValue::Integer(n)) => {
            qb.push(" >= ").push_bind(*n);
        }
        (FilterOperator::AtMost, FilterValue::Integer(n)) => {
            qb.push(" <= ").push_bind(*n);
        }
        (FilterOperator::AtLeast | FilterOperator::AtMost, FilterValue::Text(_)) => {
            qb.push(" IS NOT NULL AND FALSE");
        }
    }
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, table: &Table, condition: &FilterCondition) {
    let subquery = match (table.name, condition.field) {
        ("books", "authors.name") => Some(AUTHOR_NAME_EXISTS),
        ("books", "categories.name") => Some(CATEGORY_NAME_EXISTS),
        _ => None,
    };

    if let Some(subquery) = subquery {
        qb.push(subquery);
        push_comparison(qb, condition.operator, &condition.value);
        qb.push(")");
        return;
    }

    match table.column(condition.field) {
        Some(column) => {
            qb.push(format!("{}.{column}", table.name));
            push_comparison(qb, condition.operator, &condition.value);
        }
        None => {
            qb.push("FALSE");
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, table: &Table, predicate: &FilterPredicate) {
    qb.push(" WHERE TRUE");
    for condition in &predicate.conditions {
        qb.push(" AND ");
        push_condition(qb, table, condition);
    }

    if let Some(search) = &predicate.search {
        let columns: Vec<&str> = search.fields.iter().filter_map(|f| table.column(f)).collect();
        if columns.is_empty() {
            qb.push(" AND FALSE");
            return;
        }
        qb.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("{}.{column} ILIKE ", table.name))
                .push_bind(like_pattern(&search.term));
        }
        qb.push(")");
    }
}

fn push_order_and_window(
    qb: &mut QueryBuilder<'_, Postgres>,
    table: &Table,
    sort: SortSpec,
    pagination: Pagination,
) {
    let column = table.column(sort.field).unwrap_or("created_at");
    let dir = sort.direction.as_sql();
    if TEXT_COLUMNS.contains(&column) {
        qb.push(format!(
            " ORDER BY LOWER({table}.{column}) {dir}, {table}.{column} {dir}, {table}.id ASC",
            table = table.name,
        ));
    } else {
        qb.push(format!(
            " ORDER BY {table}.{column} {dir}, {table}.id ASC",
            table = table.name,
        ));
    }
    qb.push(" LIMIT ")
        .push_bind(i64::try_from(pagination.limit).unwrap_or(i64::MAX));
    qb.push(" OFFSET ")
        .push_bind(i64::try_from(pagination.offset).unwrap_or(i64::MAX));
}

async fn fetch_page<R>(
    conn: &mut PgConnection,
    table: &Table,
    predicate: &FilterPredicate,
    sort: SortSpec,
    pagination: Pagination,
) -> RepositoryResult<Vec<R>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut qb = QueryBuilder::<Postgres>::new(table.select);
    push_where(&mut qb, table, predicate);
    push_order_and_window(&mut qb, table, sort, pagination);
    qb.build_query_as::<R>()
        .fetch_all(conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::FindAll, e))
}

async fn count_rows(
    conn: &mut PgConnection,
    table: &Table,
    predicate: &FilterPredicate,
) -> RepositoryResult<u64> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {}", table.name));
    push_where(&mut qb, table, predicate);
    let total: i64 = qb
        .build_query_scalar::<i64>()
        .fetch_one(conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Count, e))?;
    Ok(u64::try_from(total).unwrap_or_default())
}

async fn fetch_one<R>(
    conn: &mut PgConnection,
    table: &Table,
    id: i64,
) -> RepositoryResult<Option<R>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut qb = QueryBuilder::<Postgres>::new(table.select);
    qb.push(format!(" WHERE {}.id = ", table.name)).push_bind(id);
    qb.build_query_as::<R>()
        .fetch_optional(conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::FindById, e))
}

async fn acquire(pool: &PgPool) -> RepositoryResult<sqlx::pool::PoolConnection<Postgres>> {
    pool.acquire()
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Connect, e))
}

/// Remove sensitive information from a connection URL for logging
fn sanitize_connection_url(url: &str) -> String {
    if let (Some(scheme_end), Some(at_pos)) = (url.find("://"), url.find('@')) {
        let credentials = &url[scheme_end + 3..at_pos];
        if let Some((user, _)) = credentials.split_once(':') {
            return format!("{}{user}:***{}", &url[..scheme_end + 3], &url[at_pos..]);
        }
    }
    url.to_string()
}

// Rows

#[derive(FromRow)]
struct BookRow {
    id: i64,
    title: String,
    description: String,
    year: i32,
    publisher_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    publisher_name: Option<String>,
}

#[derive(FromRow)]
struct AuthorRow {
    id: i64,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct NamedRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct LinkedAuthor {
    book_id: i64,
    id: i64,
    first_name: String,
    last_name: String,
}

#[derive(FromRow)]
struct LinkedCategory {
    book_id: i64,
    id: i64,
    name: String,
}

#[derive(FromRow)]
struct LinkedBook {
    owner_id: i64,
    id: i64,
    title: String,
    year: i32,
    publisher_id: i64,
}

/// Resolve author, category and publisher relations for a set of book rows
async fn assemble_books(conn: &mut PgConnection, rows: Vec<BookRow>) -> RepositoryResult<Vec<Book>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let authors: Vec<LinkedAuthor> = sqlx::query_as(
        "SELECT ba.book_id, a.id, a.first_name, a.last_name \
         FROM book_authors ba JOIN authors a ON a.id = ba.author_id \
         WHERE ba.book_id = ANY($1) ORDER BY a.id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| from_sqlx(RepositoryOperation::FindAll, e))?;

    let categories: Vec<LinkedCategory> = sqlx::query_as(
        "SELECT bc.book_id, c.id, c.name \
         FROM book_categories bc JOIN categories c ON c.id = bc.category_id \
         WHERE bc.book_id = ANY($1) ORDER BY c.id",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| from_sqlx(RepositoryOperation::FindAll, e))?;

    let mut authors_by_book: HashMap<i64, Vec<AuthorRef>> = HashMap::new();
    for a in authors {
        authors_by_book.entry(a.book_id).or_default().push(AuthorRef {
            id: a.id,
            first_name: a.first_name,
            last_name: a.last_name,
        });
    }
    let mut categories_by_book: HashMap<i64, Vec<CategoryRef>> = HashMap::new();
    for c in categories {
        categories_by_book
            .entry(c.book_id)
            .or_default()
            .push(CategoryRef { id: c.id, name: c.name });
    }

    Ok(rows
        .into_iter()
        .map(|row| Book {
            id: row.id,
            title: row.title,
            description: row.description,
            year: row.year,
            publisher_id: row.publisher_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            publisher: row.publisher_name.map(|name| PublisherRef {
                id: row.publisher_id,
                name,
            }),
            authors: authors_by_book.remove(&row.id).unwrap_or_default(),
            categories: categories_by_book.remove(&row.id).unwrap_or_default(),
        })
        .collect())
}

/// Book summaries keyed by owning author, category or publisher id
async fn linked_books(
    conn: &mut PgConnection,
    sql: &'static str,
    owners: &[i64],
) -> RepositoryResult<HashMap<i64, Vec<BookSummary>>> {
    let mut by_owner: HashMap<i64, Vec<BookSummary>> = HashMap::new();
    if owners.is_empty() {
        return Ok(by_owner);
    }
    let rows: Vec<LinkedBook> = sqlx::query_as(sql)
        .bind(owners)
        .fetch_all(conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::FindAll, e))?;
    for row in rows {
        by_owner.entry(row.owner_id).or_default().push(BookSummary {
            id: row.id,
            title: row.title,
            year: row.year,
            publisher_id: row.publisher_id,
        });
    }
    Ok(by_owner)
}

const BOOKS_BY_AUTHOR: &str = "SELECT ba.author_id AS owner_id, b.id, b.title, b.year, b.publisher_id \
     FROM book_authors ba JOIN books b ON b.id = ba.book_id \
     WHERE ba.author_id = ANY($1) ORDER BY b.id";
const BOOKS_BY_CATEGORY: &str = "SELECT bc.category_id AS owner_id, b.id, b.title, b.year, b.publisher_id \
     FROM book_categories bc JOIN books b ON b.id = bc.book_id \
     WHERE bc.category_id = ANY($1) ORDER BY b.id";
const BOOKS_BY_PUBLISHER: &str = "SELECT b.publisher_id AS owner_id, b.id, b.title, b.year, b.publisher_id \
     FROM books b WHERE b.publisher_id = ANY($1) ORDER BY b.id";

async fn assemble_authors(
    conn: &mut PgConnection,
    rows: Vec<AuthorRow>,
) -> RepositoryResult<Vec<Author>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut books = linked_books(conn, BOOKS_BY_AUTHOR, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Author {
            books: books.remove(&row.id).unwrap_or_default(),
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn assemble_categories(
    conn: &mut PgConnection,
    rows: Vec<NamedRow>,
) -> RepositoryResult<Vec<Category>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut books = linked_books(conn, BOOKS_BY_CATEGORY, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Category {
            books: books.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn assemble_publishers(
    conn: &mut PgConnection,
    rows: Vec<NamedRow>,
) -> RepositoryResult<Vec<Publisher>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut books = linked_books(conn, BOOKS_BY_PUBLISHER, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Publisher {
            books: books.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

/// First id in `wanted` that has no row in `table`
async fn first_missing(
    conn: &mut PgConnection,
    table: &'static str,
    wanted: &[i64],
) -> RepositoryResult<Option<i64>> {
    let found: Vec<i64> = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(wanted)
        .fetch_all(conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Lookup, e))?;
    Ok(wanted.iter().copied().find(|id| !found.contains(id)))
}

async fn check_book_refs(
    conn: &mut PgConnection,
    draft: &BookDraft,
    op: RepositoryOperation,
) -> RepositoryResult<()> {
    if first_missing(&mut *conn, "publishers", &[draft.publisher_id])
        .await?
        .is_some()
    {
        return Err(RepositoryError::missing_reference(op, "Publisher", draft.publisher_id));
    }
    if let Some(id) = first_missing(&mut *conn, "authors", &draft.author_ids).await? {
        return Err(RepositoryError::missing_reference(op, "Author", id));
    }
    if let Some(id) = first_missing(&mut *conn, "categories", &draft.category_ids).await? {
        return Err(RepositoryError::missing_reference(op, "Category", id));
    }
    Ok(())
}

async fn replace_links(
    conn: &mut PgConnection,
    book_id: i64,
    draft: &BookDraft,
    op: RepositoryOperation,
) -> RepositoryResult<()> {
    sqlx::query("DELETE FROM book_authors WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
    sqlx::query("DELETE FROM book_categories WHERE book_id = $1")
        .bind(book_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
    sqlx::query("INSERT INTO book_authors (book_id, author_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(book_id)
        .bind(&draft.author_ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
    sqlx::query(
        "INSERT INTO book_categories (book_id, category_id) SELECT $1, UNNEST($2::BIGINT[])",
    )
    .bind(book_id)
    .bind(&draft.category_ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| from_sqlx(op, e))?;
    Ok(())
}

async fn load_book(conn: &mut PgConnection, id: i64) -> RepositoryResult<Option<Book>> {
    let Some(row) = fetch_one::<BookRow>(&mut *conn, &BOOKS, id).await? else {
        return Ok(None);
    };
    Ok(assemble_books(conn, vec![row]).await?.pop())
}

/// PostgreSQL [`CatalogStore`]
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    books: PgBooks,
    authors: PgAuthors,
    categories: PgCategories,
    publishers: PgPublishers,
    users: PgUsers,
}

impl PgStore {
    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            books: PgBooks(pool.clone()),
            authors: PgAuthors(pool.clone()),
            categories: PgCategories(pool.clone()),
            publishers: PgPublishers(pool.clone()),
            users: PgUsers(pool.clone()),
            pool,
        }
    }

    /// Open a pool from configuration and optionally apply migrations
    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| {
                RepositoryError::connection_failed(format!(
                    "Failed to connect to database at '{}': {e}",
                    sanitize_connection_url(&config.url)
                ))
            })?;

        tracing::info!(
            url = %sanitize_connection_url(&config.url),
            max_connections = config.max_connections,
            "Database connection pool created"
        );

        let store = Self::from_pool(pool);
        if config.run_migrations {
            store.migrate().await?;
        }
        Ok(store)
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::connection_failed(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CatalogStore for PgStore {
    type Books = PgBooks;
    type Authors = PgAuthors;
    type Categories = PgCategories;
    type Publishers = PgPublishers;
    type Users = PgUsers;

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

#[derive(Debug, Clone)]
pub struct PgBooks(PgPool);

#[derive(Debug, Clone)]
pub struct PgAuthors(PgPool);

#[derive(Debug, Clone)]
pub struct PgCategories(PgPool);

#[derive(Debug, Clone)]
pub struct PgPublishers(PgPool);

#[derive(Debug, Clone)]
pub struct PgUsers(PgPool);

impl Repository<Book, BookDraft> for PgBooks {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Book>> {
        let mut conn = acquire(&self.0).await?;
        load_book(&mut conn, id).await
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Book>> {
        let mut conn = acquire(&self.0).await?;
        let rows = fetch_page::<BookRow>(&mut conn, &BOOKS, predicate, sort, pagination).await?;
        assemble_books(&mut conn, rows).await
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let mut conn = acquire(&self.0).await?;
        count_rows(&mut conn, &BOOKS, predicate).await
    }

    async fn create(&self, draft: BookDraft) -> RepositoryResult<Book> {
        let op = RepositoryOperation::Create;
        let draft = draft.dedup_links();
        let mut tx = self.0.begin().await.map_err(|e| from_sqlx(op, e))?;
        check_book_refs(&mut tx, &draft, op).await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO books (title, description, year, publisher_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.year)
        .bind(draft.publisher_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| from_sqlx(op, e))?;

        replace_links(&mut tx, id, &draft, op).await?;
        let book = load_book(&mut tx, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Book", id.to_string()).with_operation(op))?;
        tx.commit().await.map_err(|e| from_sqlx(op, e))?;
        Ok(book)
    }

    async fn update(&self, id: i64, draft: BookDraft) -> RepositoryResult<Book> {
        let op = RepositoryOperation::Update;
        let draft = draft.dedup_links();
        let mut tx = self.0.begin().await.map_err(|e| from_sqlx(op, e))?;
        check_book_refs(&mut tx, &draft, op).await?;

        let updated = sqlx::query(
            "UPDATE books SET title = $2, description = $3, year = $4, publisher_id = $5, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.year)
        .bind(draft.publisher_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| from_sqlx(op, e))?;
        if updated.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Book", id.to_string()).with_operation(op));
        }

        replace_links(&mut tx, id, &draft, op).await?;
        let book = load_book(&mut tx, id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Book", id.to_string()).with_operation(op))?;
        tx.commit().await.map_err(|e| from_sqlx(op, e))?;
        Ok(book)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let op = RepositoryOperation::Delete;
        let mut tx = self.0.begin().await.map_err(|e| from_sqlx(op, e))?;
        for sql in [
            "DELETE FROM book_authors WHERE book_id = $1",
            "DELETE FROM book_categories WHERE book_id = $1",
        ] {
            sqlx::query(sql)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| from_sqlx(op, e))?;
        }
        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| from_sqlx(op, e))?;
        tx.commit().await.map_err(|e| from_sqlx(op, e))?;
        Ok(deleted.rows_affected() > 0)
    }
}

impl BookRepository for PgBooks {
    async fn stats(&self) -> RepositoryResult<BookStats> {
        let op = RepositoryOperation::Aggregate;
        let mut conn = acquire(&self.0).await?;

        let (total, earliest, latest, average): (i64, Option<i32>, Option<i32>, Option<f64>) =
            sqlx::query_as(
                "SELECT COUNT(*), MIN(year), MAX(year), AVG(year)::FLOAT8 FROM books",
            )
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| from_sqlx(op, e))?;

        let by_category: Vec<(i64, String, i64)> = sqlx::query_as(
            "SELECT c.id, c.name, COUNT(*) FROM book_categories bc \
             JOIN categories c ON c.id = bc.category_id \
             GROUP BY c.id, c.name ORDER BY COUNT(*) DESC, c.name ASC",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;

        let by_publisher: Vec<(i64, String, i64)> = sqlx::query_as(
            "SELECT p.id, p.name, COUNT(*) FROM books b \
             JOIN publishers p ON p.id = b.publisher_id \
             GROUP BY p.id, p.name ORDER BY COUNT(*) DESC, p.name ASC",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;

        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Ok(BookStats {
            total_books: count(total),
            earliest_year: earliest,
            latest_year: latest,
            average_year: average,
            by_category: by_category
                .into_iter()
                .map(|(category_id, name, n)| CategoryCount {
                    category_id,
                    name,
                    count: count(n),
                })
                .collect(),
            by_publisher: by_publisher
                .into_iter()
                .map(|(publisher_id, name, n)| PublisherCount {
                    publisher_id,
                    name,
                    count: count(n),
                })
                .collect(),
        })
    }
}

impl Repository<Author, AuthorDraft> for PgAuthors {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Author>> {
        let mut conn = acquire(&self.0).await?;
        let Some(row) = fetch_one::<AuthorRow>(&mut conn, &AUTHORS, id).await? else {
            return Ok(None);
        };
        Ok(assemble_authors(&mut conn, vec![row]).await?.pop())
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Author>> {
        let mut conn = acquire(&self.0).await?;
        let rows = fetch_page::<AuthorRow>(&mut conn, &AUTHORS, predicate, sort, pagination).await?;
        assemble_authors(&mut conn, rows).await
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let mut conn = acquire(&self.0).await?;
        count_rows(&mut conn, &AUTHORS, predicate).await
    }

    async fn create(&self, draft: AuthorDraft) -> RepositoryResult<Author> {
        let row: AuthorRow = sqlx::query_as(
            "INSERT INTO authors (first_name, last_name) VALUES ($1, $2) \
             RETURNING id, first_name, last_name, created_at, updated_at",
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .fetch_one(&self.0)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Create, e))?;
        Ok(Author {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: Vec::new(),
        })
    }

    async fn update(&self, id: i64, draft: AuthorDraft) -> RepositoryResult<Author> {
        let op = RepositoryOperation::Update;
        let mut conn = acquire(&self.0).await?;
        let row: Option<AuthorRow> = sqlx::query_as(
            "UPDATE authors SET first_name = $2, last_name = $3, updated_at = NOW() WHERE id = $1 \
             RETURNING id, first_name, last_name, created_at, updated_at",
        )
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
        let row = row
            .ok_or_else(|| RepositoryError::not_found("Author", id.to_string()).with_operation(op))?;
        assemble_authors(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or_else(|| RepositoryError::not_found("Author", id.to_string()).with_operation(op))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let deleted = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.0)
            .await
            .map_err(|e| from_sqlx(RepositoryOperation::Delete, e))?;
        Ok(deleted.rows_affected() > 0)
    }
}

impl Repository<Category, CategoryDraft> for PgCategories {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        let mut conn = acquire(&self.0).await?;
        let Some(row) = fetch_one::<NamedRow>(&mut conn, &CATEGORIES, id).await? else {
            return Ok(None);
        };
        Ok(assemble_categories(&mut conn, vec![row]).await?.pop())
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Category>> {
        let mut conn = acquire(&self.0).await?;
        let rows =
            fetch_page::<NamedRow>(&mut conn, &CATEGORIES, predicate, sort, pagination).await?;
        assemble_categories(&mut conn, rows).await
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let mut conn = acquire(&self.0).await?;
        count_rows(&mut conn, &CATEGORIES, predicate).await
    }

    async fn create(&self, draft: CategoryDraft) -> RepositoryResult<Category> {
        let row: NamedRow = sqlx::query_as(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(&draft.name)
        .fetch_one(&self.0)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Create, e))?;
        Ok(Category {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: Vec::new(),
        })
    }

    async fn update(&self, id: i64, draft: CategoryDraft) -> RepositoryResult<Category> {
        let op = RepositoryOperation::Update;
        let mut conn = acquire(&self.0).await?;
        let row: Option<NamedRow> = sqlx::query_as(
            "UPDATE categories SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(&draft.name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
        let row = row.ok_or_else(|| {
            RepositoryError::not_found("Category", id.to_string()).with_operation(op)
        })?;
        assemble_categories(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or_else(|| RepositoryError::not_found("Category", id.to_string()).with_operation(op))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let deleted = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.0)
            .await
            .map_err(|e| from_sqlx(RepositoryOperation::Delete, e))?;
        Ok(deleted.rows_affected() > 0)
    }
}

impl NameLookup<Category> for PgCategories {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Category>> {
        let mut conn = acquire(&self.0).await?;
        let row: Option<NamedRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM categories WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Lookup, e))?;
        match row {
            Some(row) => Ok(assemble_categories(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

impl Repository<Publisher, PublisherDraft> for PgPublishers {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Publisher>> {
        let mut conn = acquire(&self.0).await?;
        let Some(row) = fetch_one::<NamedRow>(&mut conn, &PUBLISHERS, id).await? else {
            return Ok(None);
        };
        Ok(assemble_publishers(&mut conn, vec![row]).await?.pop())
    }

    async fn find_all(
        &self,
        predicate: &FilterPredicate,
        sort: SortSpec,
        pagination: Pagination,
    ) -> RepositoryResult<Vec<Publisher>> {
        let mut conn = acquire(&self.0).await?;
        let rows =
            fetch_page::<NamedRow>(&mut conn, &PUBLISHERS, predicate, sort, pagination).await?;
        assemble_publishers(&mut conn, rows).await
    }

    async fn count(&self, predicate: &FilterPredicate) -> RepositoryResult<u64> {
        let mut conn = acquire(&self.0).await?;
        count_rows(&mut conn, &PUBLISHERS, predicate).await
    }

    async fn create(&self, draft: PublisherDraft) -> RepositoryResult<Publisher> {
        let row: NamedRow = sqlx::query_as(
            "INSERT INTO publishers (name) VALUES ($1) RETURNING id, name, created_at, updated_at",
        )
        .bind(&draft.name)
        .fetch_one(&self.0)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Create, e))?;
        Ok(Publisher {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
            books: Vec::new(),
        })
    }

    async fn update(&self, id: i64, draft: PublisherDraft) -> RepositoryResult<Publisher> {
        let op = RepositoryOperation::Update;
        let mut conn = acquire(&self.0).await?;
        let row: Option<NamedRow> = sqlx::query_as(
            "UPDATE publishers SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING id, name, created_at, updated_at",
        )
        .bind(id)
        .bind(&draft.name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| from_sqlx(op, e))?;
        let row = row.ok_or_else(|| {
            RepositoryError::not_found("Publisher", id.to_string()).with_operation(op)
        })?;
        assemble_publishers(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or_else(|| {
                RepositoryError::not_found("Publisher", id.to_string()).with_operation(op)
            })
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let op = RepositoryOperation::Delete;
        let has_books: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE publisher_id = $1)")
                .bind(id)
                .fetch_one(&self.0)
                .await
                .map_err(|e| from_sqlx(op, e))?;
        if has_books {
            return Err(RepositoryError::constraint_violation(
                op,
                "Publisher still has books and cannot be deleted.",
            )
            .with_entity("Publisher", id.to_string()));
        }
        let deleted = sqlx::query("DELETE FROM publishers WHERE id = $1")
            .bind(id)
            .execute(&self.0)
            .await
            .map_err(|e| from_sqlx(op, e))?;
        Ok(deleted.rows_affected() > 0)
    }
}

impl NameLookup<Publisher> for PgPublishers {
    async fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Publisher>> {
        let mut conn = acquire(&self.0).await?;
        let row: Option<NamedRow> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM publishers WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| from_sqlx(RepositoryOperation::Lookup, e))?;
        match row {
            Some(row) => Ok(assemble_publishers(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

impl UserRepository for PgUsers {
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        sqlx::query_as("SELECT id, email, password_hash, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.0)
            .await
            .map_err(|e| from_sqlx(RepositoryOperation::FindById, e))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        sqlx::query_as("SELECT id, email, password_hash, created_at FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.0)
            .await
            .map_err(|e| from_sqlx(RepositoryOperation::Lookup, e))
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<User> {
        sqlx::query_as(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) \
             RETURNING id, email, password_hash, created_at",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.0)
        .await
        .map_err(|e| match from_sqlx(RepositoryOperation::Create, e) {
            err if err.kind == RepositoryErrorKind::AlreadyExists => {
                RepositoryError::already_exists("User", user.email.clone())
            }
            err => err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build_predicate, profile, QueryProfile, RawQuery, SortDirection};

    fn raw(pairs: &[(&str, &str)]) -> RawQuery {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn where_sql(table: &Table, pairs: &[(&str, &str)], profile: &QueryProfile) -> String {
        let predicate = build_predicate(&raw(pairs), profile);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM x");
        push_where(&mut qb, table, &predicate);
        qb.sql().to_string()
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("dune"), "%dune%");
        assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
    }

    #[test]
    fn test_where_binds_values() {
        let sql = where_sql(
            &BOOKS,
            &[("title", "'; DROP TABLE books; --"), ("minYear", "1950")],
            &profile::BOOKS,
        );
        assert!(sql.contains("books.title ILIKE $1"));
        assert!(sql.contains("books.year >= $2"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn test_relation_filters_use_subqueries() {
        let sql = where_sql(&BOOKS, &[("author", "herbert"), ("category", "sf")], &profile::BOOKS);
        assert!(sql.contains("EXISTS (SELECT 1 FROM book_authors"));
        assert!(sql.contains("EXISTS (SELECT 1 FROM book_categories"));
    }

    #[test]
    fn test_search_is_disjunction() {
        let sql = where_sql(&AUTHORS, &[("search", "le")], &profile::AUTHORS);
        assert!(sql.contains("(authors.first_name ILIKE $1 OR authors.last_name ILIKE $2)"));
    }

    #[test]
    fn test_order_falls_back_to_known_column() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM categories");
        push_order_and_window(
            &mut qb,
            &CATEGORIES,
            SortSpec::new("password", SortDirection::Ascending),
            Pagination::page(2, 10),
        );
        let sql = qb.sql();
        assert!(sql.contains("ORDER BY categories.created_at ASC, categories.id ASC"));
        assert!(sql.contains("LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_text_order_ignores_case() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM categories");
        push_order_and_window(
            &mut qb,
            &CATEGORIES,
            SortSpec::new("name", SortDirection::Descending),
            Pagination::page(1, 10),
        );
        assert!(qb.sql().contains(
            "ORDER BY LOWER(categories.name) DESC, categories.name DESC, categories.id ASC"
        ));
    }

    #[test]
    fn test_sanitize_connection_url() {
        assert_eq!(
            sanitize_connection_url("postgres://app:hunter2@db:5432/catalog"),
            "postgres://app:***@db:5432/catalog"
        );
        assert_eq!(sanitize_connection_url("postgres://db/catalog"), "postgres://db/catalog");
    }
}
