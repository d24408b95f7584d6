//! Row types shared by every store, plus the write-side field sets.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::models::Role;

/// Author record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

/// Book record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub published_date: Option<NaiveDate>,
    pub isbn: String,
    pub price: f64,
    pub stock: i32,
    pub cover_image_url: Option<String>,
}

/// Book joined with its author
#[derive(Debug, Clone, PartialEq)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author: Author,
}

/// User record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Review record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Review {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Every writable author column. Built from validated input.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorFields {
    pub name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

impl From<Author> for AuthorFields {
    fn from(a: Author) -> Self {
        Self {
            name: a.name,
            bio: a.bio,
            birth_date: a.birth_date,
            nationality: a.nationality,
        }
    }
}

/// Every writable book column.
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub author_id: i32,
    pub published_date: Option<NaiveDate>,
    pub isbn: String,
    pub price: f64,
    pub stock: i32,
    pub cover_image_url: Option<String>,
}

/// Every writable user column.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFields {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl From<User> for UserFields {
    fn from(u: User) -> Self {
        Self {
            username: u.username,
            email: u.email,
            password: u.password,
            role: u.role,
        }
    }
}

/// Every writable review column. `created_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewFields {
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

impl From<Review> for ReviewFields {
    fn from(r: Review) -> Self {
        Self {
            book_id: r.book_id,
            user_id: r.user_id,
            rating: r.rating,
            comment: r.comment,
        }
    }
}

/// Book search filters. Each one is a case-insensitive substring match;
/// empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSearch {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_name: Option<String>,
}

impl BookSearch {
    pub fn new(
        title: Option<String>,
        isbn: Option<String>,
        author_name: Option<String>,
    ) -> Self {
        fn non_empty(s: Option<String>) -> Option<String> {
            s.filter(|s| !s.is_empty())
        }
        Self {
            title: non_empty(title),
            isbn: non_empty(isbn),
            author_name: non_empty(author_name),
        }
    }

    /// True when no filter is set (search returns every book).
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.isbn.is_none() && self.author_name.is_none()
    }

    /// In-process equivalent of the SQL `ILIKE '%needle%'` match.
    pub fn matches(&self, book: &Book, author: &Author) -> bool {
        fn contains(hay: &str, needle: &Option<String>) -> bool {
            needle
                .as_ref()
                .map_or(true, |n| hay.to_lowercase().contains(&n.to_lowercase()))
        }
        contains(&book.title, &self.title)
            && contains(&book.isbn, &self.isbn)
            && contains(&author.name, &self.author_name)
    }
}
