//! In-memory store
//!
//! Same contract as [`PgStore`](super::PgStore): unique keys, foreign keys
//! and cascades are enforced here. All tables sit behind one `RwLock`, so
//! every call is atomic. Used by `bookstore serve --memory` and the tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::records::{
    Author, AuthorFields, Book, BookFields, BookSearch, BookWithAuthor, Review, ReviewFields,
    User, UserFields,
};
use super::{conflict, DbError, Store};

#[derive(Default)]
struct Tables {
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    users: BTreeMap<i32, User>,
    reviews: BTreeMap<i32, Review>,
    // last id handed out per table, like a SERIAL sequence
    author_seq: i32,
    book_seq: i32,
    user_seq: i32,
    review_seq: i32,
}

impl Tables {
    fn check_isbn(&self, isbn: &str, except: Option<i32>) -> Result<(), DbError> {
        let taken = self
            .books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != except);
        if taken {
            return Err(DbError::Conflict {
                resource: "book",
                detail: conflict::ISBN_TAKEN,
            });
        }
        Ok(())
    }

    fn check_user_keys(&self, fields: &UserFields, except: Option<i32>) -> Result<(), DbError> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            let detail = if user.username == fields.username {
                conflict::USERNAME_TAKEN
            } else if user.email == fields.email {
                conflict::EMAIL_TAKEN
            } else {
                continue;
            };
            return Err(DbError::Conflict {
                resource: "user",
                detail,
            });
        }
        Ok(())
    }

    fn check_review_refs(&self, fields: &ReviewFields, except: Option<i32>) -> Result<(), DbError> {
        if !self.books.contains_key(&fields.book_id) {
            return Err(DbError::not_found("book", fields.book_id));
        }
        if !self.users.contains_key(&fields.user_id) {
            return Err(DbError::not_found("user", fields.user_id));
        }
        let duplicate = self.reviews.values().any(|r| {
            r.book_id == fields.book_id && r.user_id == fields.user_id && Some(r.id) != except
        });
        if duplicate {
            return Err(DbError::Conflict {
                resource: "review",
                detail: conflict::ALREADY_REVIEWED,
            });
        }
        Ok(())
    }

    fn remove_book(&mut self, id: i32) -> Option<Book> {
        let book = self.books.remove(&id)?;
        self.reviews.retain(|_, r| r.book_id != id);
        Some(book)
    }
}

/// Store holding every table in process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn book_from(id: i32, fields: &BookFields) -> Book {
    Book {
        id,
        title: fields.title.clone(),
        author_id: fields.author_id,
        published_date: fields.published_date,
        isbn: fields.isbn.clone(),
        price: fields.price,
        stock: fields.stock,
        cover_image_url: fields.cover_image_url.clone(),
    }
}

fn user_from(id: i32, fields: &UserFields) -> User {
    User {
        id,
        username: fields.username.clone(),
        email: fields.email.clone(),
        password: fields.password.clone(),
        role: fields.role,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_author(&self, fields: &AuthorFields) -> Result<Author, DbError> {
        let mut t = self.tables.write().await;
        t.author_seq += 1;
        let author = Author {
            id: t.author_seq,
            name: fields.name.clone(),
            bio: fields.bio.clone(),
            birth_date: fields.birth_date,
            nationality: fields.nationality.clone(),
        };
        t.authors.insert(author.id, author.clone());
        Ok(author)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, DbError> {
        Ok(self.tables.read().await.authors.values().cloned().collect())
    }

    async fn get_author(&self, id: i32) -> Result<Option<Author>, DbError> {
        Ok(self.tables.read().await.authors.get(&id).cloned())
    }

    async fn update_author(
        &self,
        id: i32,
        fields: &AuthorFields,
    ) -> Result<Option<Author>, DbError> {
        let mut t = self.tables.write().await;
        let Some(author) = t.authors.get_mut(&id) else {
            return Ok(None);
        };
        author.name = fields.name.clone();
        author.bio = fields.bio.clone();
        author.birth_date = fields.birth_date;
        author.nationality = fields.nationality.clone();
        Ok(Some(author.clone()))
    }

    async fn delete_author(&self, id: i32) -> Result<bool, DbError> {
        let mut t = self.tables.write().await;
        if t.authors.remove(&id).is_none() {
            return Ok(false);
        }
        let book_ids: Vec<i32> = t
            .books
            .values()
            .filter(|b| b.author_id == id)
            .map(|b| b.id)
            .collect();
        for book_id in book_ids {
            t.remove_book(book_id);
        }
        Ok(true)
    }

    async fn insert_book(&self, fields: &BookFields) -> Result<Book, DbError> {
        let mut t = self.tables.write().await;
        if !t.authors.contains_key(&fields.author_id) {
            return Err(DbError::not_found("author", fields.author_id));
        }
        t.check_isbn(&fields.isbn, None)?;
        t.book_seq += 1;
        let book = book_from(t.book_seq, fields);
        t.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn list_books(&self) -> Result<Vec<Book>, DbError> {
        Ok(self.tables.read().await.books.values().cloned().collect())
    }

    async fn get_book(&self, id: i32) -> Result<Option<Book>, DbError> {
        Ok(self.tables.read().await.books.get(&id).cloned())
    }

    async fn update_book(&self, id: i32, fields: &BookFields) -> Result<Option<Book>, DbError> {
        let mut t = self.tables.write().await;
        if !t.books.contains_key(&id) {
            return Ok(None);
        }
        if !t.authors.contains_key(&fields.author_id) {
            return Err(DbError::not_found("author", fields.author_id));
        }
        t.check_isbn(&fields.isbn, Some(id))?;
        let book = book_from(id, fields);
        t.books.insert(id, book.clone());
        Ok(Some(book))
    }

    async fn delete_book(&self, id: i32) -> Result<Option<Book>, DbError> {
        Ok(self.tables.write().await.remove_book(id))
    }

    async fn books_by_author(&self, author_id: i32) -> Result<Vec<Book>, DbError> {
        let t = self.tables.read().await;
        Ok(t.books
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn search_books(&self, search: &BookSearch) -> Result<Vec<BookWithAuthor>, DbError> {
        let t = self.tables.read().await;
        let found = t
            .books
            .values()
            .filter_map(|book| {
                let author = t.authors.get(&book.author_id)?;
                search.matches(book, author).then(|| BookWithAuthor {
                    book: book.clone(),
                    author: author.clone(),
                })
            })
            .collect();
        Ok(found)
    }

    async fn insert_user(&self, fields: &UserFields) -> Result<User, DbError> {
        let mut t = self.tables.write().await;
        t.check_user_keys(fields, None)?;
        t.user_seq += 1;
        let user = user_from(t.user_seq, fields);
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: i32, fields: &UserFields) -> Result<Option<User>, DbError> {
        let mut t = self.tables.write().await;
        if !t.users.contains_key(&id) {
            return Ok(None);
        }
        t.check_user_keys(fields, Some(id))?;
        let user = user_from(id, fields);
        t.users.insert(id, user.clone());
        Ok(Some(user))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, DbError> {
        let mut t = self.tables.write().await;
        if t.users.remove(&id).is_none() {
            return Ok(false);
        }
        t.reviews.retain(|_, r| r.user_id != id);
        Ok(true)
    }

    async fn insert_review(&self, fields: &ReviewFields) -> Result<Review, DbError> {
        let mut t = self.tables.write().await;
        t.check_review_refs(fields, None)?;
        t.review_seq += 1;
        let review = Review {
            id: t.review_seq,
            book_id: fields.book_id,
            user_id: fields.user_id,
            rating: fields.rating,
            comment: fields.comment.clone(),
            created_at: Utc::now(),
        };
        t.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, DbError> {
        Ok(self.tables.read().await.reviews.values().cloned().collect())
    }

    async fn get_review(&self, id: i32) -> Result<Option<Review>, DbError> {
        Ok(self.tables.read().await.reviews.get(&id).cloned())
    }

    async fn find_review(&self, book_id: i32, user_id: i32) -> Result<Option<Review>, DbError> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .values()
            .find(|r| r.book_id == book_id && r.user_id == user_id)
            .cloned())
    }

    async fn reviews_by_book(&self, book_id: i32) -> Result<Vec<Review>, DbError> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .values()
            .filter(|r| r.book_id == book_id)
            .cloned()
            .collect())
    }

    async fn reviews_by_user(&self, user_id: i32) -> Result<Vec<Review>, DbError> {
        let t = self.tables.read().await;
        Ok(t.reviews
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_review(
        &self,
        id: i32,
        fields: &ReviewFields,
    ) -> Result<Option<Review>, DbError> {
        let mut t = self.tables.write().await;
        if !t.reviews.contains_key(&id) {
            return Ok(None);
        }
        t.check_review_refs(fields, Some(id))?;
        let Some(review) = t.reviews.get_mut(&id) else {
            return Ok(None);
        };
        review.book_id = fields.book_id;
        review.user_id = fields.user_id;
        review.rating = fields.rating;
        review.comment = fields.comment.clone();
        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, id: i32) -> Result<bool, DbError> {
        Ok(self.tables.write().await.reviews.remove(&id).is_some())
    }
}
