//! Demo catalog
//!
//! Inserts a default user and a small catalog of classic books through the
//! repository traits, so it works against any [`CatalogStore`]. Seeding is
//! skipped when the default user already exists.

use std::collections::HashMap;

use crate::auth::PasswordHasher;
use crate::error::{Error, Result};
use crate::models::{AuthorDraft, BookDraft, CategoryDraft, NewUser, PublisherDraft};
use crate::repository::{CatalogStore, Repository, UserRepository};

/// Email and password of the seeded user
pub const DEFAULT_USER: &str = "gen.vikat@ametikool.ee";

const CATEGORIES: &[&str] = &[
    "Fiction",
    "Non-Fiction",
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Romance",
    "Thriller",
    "Biography",
    "History",
    "Technology",
];

const PUBLISHERS: &[&str] = &[
    "Charles Scribner's Sons",
    "J. B. Lippincott & Co.",
    "Chilton Books",
    "George Allen & Unwin",
    "Collins",
    "William Collins, Sons",
    "Dvir Publishing House",
    "Addison-Wesley",
    "Crown Publishing Group",
    "T. Egerton",
    "Prentice Hall",
    "Doubleday",
    "Simon & Schuster",
    "McClelland & Stewart",
];

const AUTHORS: &[(&str, &str)] = &[
    ("F. Scott", "Fitzgerald"),
    ("Harper", "Lee"),
    ("Frank", "Herbert"),
    ("J.R.R.", "Tolkien"),
    ("Agatha", "Christie"),
    ("Yuval Noah", "Harari"),
    ("Andrew", "Hunt"),
    ("David", "Thomas"),
    ("Gillian", "Flynn"),
    ("Jane", "Austen"),
    ("Andy", "Weir"),
    ("Robert C.", "Martin"),
    ("Dan", "Brown"),
    ("Walter", "Isaacson"),
    ("Margaret", "Atwood"),
];

struct DemoBook {
    title: &'static str,
    description: &'static str,
    year: i32,
    authors: &'static [&'static str],
    publisher: &'static str,
    categories: &'static [&'static str],
}

const BOOKS: &[DemoBook] = &[
    DemoBook {
        title: "The Great Gatsby",
        description: "A classic American novel about the Jazz Age",
        year: 1925,
        authors: &["F. Scott Fitzgerald"],
        publisher: "Charles Scribner's Sons",
        categories: &["Fiction"],
    },
    DemoBook {
        title: "To Kill a Mockingbird",
        description: "A novel about racial injustice in the American South",
        year: 1960,
        authors: &["Harper Lee"],
        publisher: "J. B. Lippincott & Co.",
        categories: &["Fiction"],
    },
    DemoBook {
        title: "Dune",
        description: "Epic science fiction novel set in the distant future",
        year: 1965,
        authors: &["Frank Herbert"],
        publisher: "Chilton Books",
        categories: &["Science Fiction", "Fantasy"],
    },
    DemoBook {
        title: "The Hobbit",
        description: "A fantasy adventure about a hobbit's unexpected journey",
        year: 1937,
        authors: &["J.R.R. Tolkien"],
        publisher: "George Allen & Unwin",
        categories: &["Fantasy", "Fiction"],
    },
    DemoBook {
        title: "Agatha Christie: An Autobiography",
        description: "The life story of the famous mystery writer",
        year: 1977,
        authors: &["Agatha Christie"],
        publisher: "Collins",
        categories: &["Biography", "Non-Fiction"],
    },
    DemoBook {
        title: "The Murder of Roger Ackroyd",
        description: "Classic mystery novel with an unexpected twist",
        year: 1926,
        authors: &["Agatha Christie"],
        publisher: "William Collins, Sons",
        categories: &["Mystery", "Fiction"],
    },
    DemoBook {
        title: "Sapiens",
        description: "A brief history of humankind",
        year: 2011,
        authors: &["Yuval Noah Harari"],
        publisher: "Dvir Publishing House",
        categories: &["History", "Non-Fiction"],
    },
    DemoBook {
        title: "The Pragmatic Programmer",
        description: "Your journey to mastery in software development",
        year: 1999,
        authors: &["Andrew Hunt", "David Thomas"],
        publisher: "Addison-Wesley",
        categories: &["Technology", "Non-Fiction"],
    },
    DemoBook {
        title: "Gone Girl",
        description: "Psychological thriller about a marriage gone wrong",
        year: 2012,
        authors: &["Gillian Flynn"],
        publisher: "Crown Publishing Group",
        categories: &["Thriller", "Mystery"],
    },
    DemoBook {
        title: "Pride and Prejudice",
        description: "Classic romance novel about love and social class",
        year: 1813,
        authors: &["Jane Austen"],
        publisher: "T. Egerton",
        categories: &["Romance", "Fiction"],
    },
    DemoBook {
        title: "The Martian",
        description: "Science fiction about an astronaut stranded on Mars",
        year: 2011,
        authors: &["Andy Weir"],
        publisher: "Crown Publishing Group",
        categories: &["Science Fiction"],
    },
    DemoBook {
        title: "Clean Code",
        description: "A handbook of agile software craftsmanship",
        year: 2008,
        authors: &["Robert C. Martin"],
        publisher: "Prentice Hall",
        categories: &["Technology", "Non-Fiction"],
    },
    DemoBook {
        title: "The Da Vinci Code",
        description: "Mystery thriller involving art, history, and religion",
        year: 2003,
        authors: &["Dan Brown"],
        publisher: "Doubleday",
        categories: &["Thriller", "Mystery"],
    },
    DemoBook {
        title: "Steve Jobs",
        description: "Biography of the Apple co-founder",
        year: 2011,
        authors: &["Walter Isaacson"],
        publisher: "Simon & Schuster",
        categories: &["Biography", "Non-Fiction"],
    },
    DemoBook {
        title: "The Handmaid's Tale",
        description: "Dystopian novel about a totalitarian society",
        year: 1985,
        authors: &["Margaret Atwood"],
        publisher: "McClelland & Stewart",
        categories: &["Science Fiction", "Fiction"],
    },
];

/// Rows inserted by [`seed_demo_data`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub categories: usize,
    pub publishers: usize,
    pub authors: usize,
    pub books: usize,
}

fn lookup(ids: &HashMap<&str, i64>, kind: &str, name: &str) -> Result<i64> {
    ids.get(name)
        .copied()
        .ok_or_else(|| Error::Internal(format!("Demo {kind} not found: {name}")))
}

/// Populate `store` with the demo catalog
pub async fn seed_demo_data<S>(store: &S, passwords: &PasswordHasher) -> Result<SeedSummary>
where
    S: CatalogStore,
{
    if store.users().find_by_email(DEFAULT_USER).await?.is_some() {
        tracing::info!("Demo data already present, skipping seed");
        return Ok(SeedSummary::default());
    }

    let mut summary = SeedSummary::default();

    let hasher = passwords.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(DEFAULT_USER))
        .await
        .map_err(|e| Error::Internal(format!("Password task failed: {e}")))??;
    store
        .users()
        .create(NewUser {
            email: DEFAULT_USER.to_string(),
            password_hash,
        })
        .await?;
    summary.users = 1;

    let mut categories = HashMap::new();
    for &name in CATEGORIES {
        let category = store
            .categories()
            .create(CategoryDraft {
                name: name.to_string(),
            })
            .await?;
        categories.insert(name, category.id);
    }
    summary.categories = categories.len();

    let mut publishers = HashMap::new();
    for &name in PUBLISHERS {
        let publisher = store
            .publishers()
            .create(PublisherDraft {
                name: name.to_string(),
            })
            .await?;
        publishers.insert(name, publisher.id);
    }
    summary.publishers = publishers.len();

    let mut authors = HashMap::new();
    let full_names: Vec<String> = AUTHORS
        .iter()
        .map(|(first, last)| format!("{first} {last}"))
        .collect();
    for ((first, last), full_name) in AUTHORS.iter().zip(&full_names) {
        let author = store
            .authors()
            .create(AuthorDraft {
                first_name: first.to_string(),
                last_name: last.to_string(),
            })
            .await?;
        authors.insert(full_name.as_str(), author.id);
    }
    summary.authors = authors.len();

    for book in BOOKS {
        let draft = BookDraft {
            title: book.title.to_string(),
            description: book.description.to_string(),
            year: book.year,
            author_ids: book
                .authors
                .iter()
                .map(|name| lookup(&authors, "author", name))
                .collect::<Result<_>>()?,
            category_ids: book
                .categories
                .iter()
                .map(|name| lookup(&categories, "category", name))
                .collect::<Result<_>>()?,
            publisher_id: lookup(&publishers, "publisher", book.publisher)?,
        };
        let created = store.books().create(draft).await?;
        tracing::debug!(
            book_id = created.id,
            authors = created.authors.len(),
            categories = created.categories.len(),
            "Seeded book {}",
            created.title
        );
        summary.books += 1;
    }

    tracing::info!(
        categories = summary.categories,
        publishers = summary.publishers,
        authors = summary.authors,
        books = summary.books,
        "Demo data seeded"
    );
    Ok(summary)
}
