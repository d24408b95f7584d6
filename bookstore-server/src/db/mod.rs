//! Database layer - store trait, PostgreSQL and in-memory stores
//!
//! # Design Principles
//!
//! - Connection pool (max 5 connections by default) - no Arc<Mutex<Connection>>
//! - Store methods are row-level primitives; the catalog managers own the
//!   existence/uniqueness rules on top of them
//! - Unique and foreign-key constraints are the source of truth: a violation
//!   that slips past a pre-check surfaces as `Conflict` / `NotFound`
//! - Cascades (author → books → reviews, user → reviews) happen in the store

use async_trait::async_trait;

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod records;

pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_options};
pub use postgres::PgStore;
pub use records::{
    Author, AuthorFields, Book, BookFields, BookSearch, BookWithAuthor, Review, ReviewFields,
    User, UserFields,
};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict on {resource}: {detail}")]
    Conflict {
        resource: &'static str,
        detail: &'static str,
    },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Conflict details shared by both stores so callers see the same text.
pub mod conflict {
    pub const ISBN_TAKEN: &str = "isbn already exists";
    pub const USERNAME_TAKEN: &str = "username already exists";
    pub const EMAIL_TAKEN: &str = "email already registered";
    pub const ALREADY_REVIEWED: &str = "user has already reviewed this book";
}

/// Row-level access to the four catalog tables.
///
/// `get_*` return `Ok(None)` for a missing row; `update_*` / `delete_*`
/// return `None` / `false` when the target row is gone. Inserts and updates
/// report unique violations as [`DbError::Conflict`] and dangling references
/// as [`DbError::NotFound`].
#[async_trait]
pub trait Store: Send + Sync {
    // Authors
    async fn insert_author(&self, fields: &AuthorFields) -> Result<Author, DbError>;
    async fn list_authors(&self) -> Result<Vec<Author>, DbError>;
    async fn get_author(&self, id: i32) -> Result<Option<Author>, DbError>;
    async fn update_author(&self, id: i32, fields: &AuthorFields)
        -> Result<Option<Author>, DbError>;
    /// Deletes the author, its books and their reviews.
    async fn delete_author(&self, id: i32) -> Result<bool, DbError>;

    // Books
    async fn insert_book(&self, fields: &BookFields) -> Result<Book, DbError>;
    async fn list_books(&self) -> Result<Vec<Book>, DbError>;
    async fn get_book(&self, id: i32) -> Result<Option<Book>, DbError>;
    async fn update_book(&self, id: i32, fields: &BookFields) -> Result<Option<Book>, DbError>;
    /// Deletes the book and its reviews, returning the deleted row.
    async fn delete_book(&self, id: i32) -> Result<Option<Book>, DbError>;
    async fn books_by_author(&self, author_id: i32) -> Result<Vec<Book>, DbError>;
    async fn search_books(&self, search: &BookSearch) -> Result<Vec<BookWithAuthor>, DbError>;

    // Users
    async fn insert_user(&self, fields: &UserFields) -> Result<User, DbError>;
    async fn list_users(&self) -> Result<Vec<User>, DbError>;
    async fn get_user(&self, id: i32) -> Result<Option<User>, DbError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
    async fn update_user(&self, id: i32, fields: &UserFields) -> Result<Option<User>, DbError>;
    /// Deletes the user and their reviews.
    async fn delete_user(&self, id: i32) -> Result<bool, DbError>;

    // Reviews
    async fn insert_review(&self, fields: &ReviewFields) -> Result<Review, DbError>;
    async fn list_reviews(&self) -> Result<Vec<Review>, DbError>;
    async fn get_review(&self, id: i32) -> Result<Option<Review>, DbError>;
    async fn find_review(&self, book_id: i32, user_id: i32) -> Result<Option<Review>, DbError>;
    async fn reviews_by_book(&self, book_id: i32) -> Result<Vec<Review>, DbError>;
    async fn reviews_by_user(&self, user_id: i32) -> Result<Vec<Review>, DbError>;
    async fn update_review(&self, id: i32, fields: &ReviewFields)
        -> Result<Option<Review>, DbError>;
    async fn delete_review(&self, id: i32) -> Result<bool, DbError>;
}
