//! Book manager
//!
//! Books always hang off an existing author. Reads that return "detail"
//! views pair each book with its author.

use crate::db::{Author, Book, BookFields, BookSearch, BookWithAuthor, DbError, Store};

/// Book manager
pub struct Books<'a> {
    store: &'a dyn Store,
}

impl<'a> Books<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn require_author(&self, author_id: i32) -> Result<Author, DbError> {
        self.store
            .get_author(author_id)
            .await?
            .ok_or_else(|| DbError::not_found("author", author_id))
    }

    /// Insert a book. Fails with `NotFound` for a missing author and
    /// `Conflict` for a taken ISBN.
    pub async fn create(&self, fields: BookFields) -> Result<Book, DbError> {
        self.require_author(fields.author_id).await?;
        let book = self.store.insert_book(&fields).await?;
        tracing::info!(book_id = book.id, author_id = book.author_id, "Book created");
        Ok(book)
    }

    pub async fn list(&self) -> Result<Vec<Book>, DbError> {
        self.store.list_books().await
    }

    pub async fn get(&self, id: i32) -> Result<BookWithAuthor, DbError> {
        let book = self
            .store
            .get_book(id)
            .await?
            .ok_or_else(|| DbError::not_found("book", id))?;
        // author vanished between the reads: the cascade took the book too
        let author = self
            .store
            .get_author(book.author_id)
            .await?
            .ok_or_else(|| DbError::not_found("book", id))?;
        Ok(BookWithAuthor { book, author })
    }

    /// Overwrite every column. Both the book and the target author must exist.
    pub async fn replace(&self, id: i32, fields: BookFields) -> Result<BookWithAuthor, DbError> {
        if self.store.get_book(id).await?.is_none() {
            return Err(DbError::not_found("book", id));
        }
        let author = self.require_author(fields.author_id).await?;
        let book = self
            .store
            .update_book(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("book", id))?;
        tracing::info!(book_id = id, "Book replaced");
        Ok(BookWithAuthor { book, author })
    }

    /// Delete the book and its reviews, returning the deleted row.
    pub async fn delete(&self, id: i32) -> Result<Book, DbError> {
        let book = self
            .store
            .delete_book(id)
            .await?
            .ok_or_else(|| DbError::not_found("book", id))?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(book)
    }

    pub async fn by_author(&self, author_id: i32) -> Result<Vec<BookWithAuthor>, DbError> {
        let author = self.require_author(author_id).await?;
        let books = self.store.books_by_author(author_id).await?;
        Ok(books
            .into_iter()
            .map(|book| BookWithAuthor {
                book,
                author: author.clone(),
            })
            .collect())
    }

    /// Filtered search. No filters returns every book; the result may be
    /// empty.
    pub async fn search(&self, search: &BookSearch) -> Result<Vec<BookWithAuthor>, DbError> {
        tracing::debug!(?search, "Searching books");
        self.store.search_books(search).await
    }
}
