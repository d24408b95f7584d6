//! Review manager
//!
//! A review needs an existing user and book, and each user reviews a
//! given book at most once.

use crate::db::{conflict, DbError, Review, ReviewFields, Store};

/// Partial review update. `comment: Some(None)` clears the comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub book_id: Option<i32>,
    pub user_id: Option<i32>,
    pub rating: Option<i32>,
    pub comment: Option<Option<String>>,
}

impl ReviewPatch {
    pub fn apply(self, current: Review) -> ReviewFields {
        let mut fields = ReviewFields::from(current);
        if let Some(book_id) = self.book_id {
            fields.book_id = book_id;
        }
        if let Some(user_id) = self.user_id {
            fields.user_id = user_id;
        }
        if let Some(rating) = self.rating {
            fields.rating = rating;
        }
        if let Some(comment) = self.comment {
            fields.comment = comment;
        }
        fields
    }
}

/// Review manager
pub struct Reviews<'a> {
    store: &'a dyn Store,
}

impl<'a> Reviews<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn require_user(&self, id: i32) -> Result<(), DbError> {
        match self.store.get_user(id).await? {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("user", id)),
        }
    }

    async fn require_book(&self, id: i32) -> Result<(), DbError> {
        match self.store.get_book(id).await? {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("book", id)),
        }
    }

    /// User is checked before book, then the (book, user) pair.
    pub async fn create(&self, fields: ReviewFields) -> Result<Review, DbError> {
        self.require_user(fields.user_id).await?;
        self.require_book(fields.book_id).await?;
        if self
            .store
            .find_review(fields.book_id, fields.user_id)
            .await?
            .is_some()
        {
            return Err(DbError::Conflict {
                resource: "review",
                detail: conflict::ALREADY_REVIEWED,
            });
        }
        let review = self.store.insert_review(&fields).await?;
        tracing::info!(
            review_id = review.id,
            book_id = review.book_id,
            user_id = review.user_id,
            "Review created"
        );
        Ok(review)
    }

    pub async fn list(&self) -> Result<Vec<Review>, DbError> {
        self.store.list_reviews().await
    }

    pub async fn get(&self, id: i32) -> Result<Review, DbError> {
        self.store
            .get_review(id)
            .await?
            .ok_or_else(|| DbError::not_found("review", id))
    }

    pub async fn by_book(&self, book_id: i32) -> Result<Vec<Review>, DbError> {
        self.require_book(book_id).await?;
        self.store.reviews_by_book(book_id).await
    }

    pub async fn by_user(&self, user_id: i32) -> Result<Vec<Review>, DbError> {
        self.require_user(user_id).await?;
        self.store.reviews_by_user(user_id).await
    }

    /// Overwrite every column except `created_at`.
    pub async fn replace(&self, id: i32, fields: ReviewFields) -> Result<Review, DbError> {
        self.get(id).await?;
        self.require_user(fields.user_id).await?;
        self.require_book(fields.book_id).await?;
        let review = self
            .store
            .update_review(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("review", id))?;
        tracing::info!(review_id = id, "Review replaced");
        Ok(review)
    }

    pub async fn patch(&self, id: i32, patch: ReviewPatch) -> Result<Review, DbError> {
        let current = self.get(id).await?;
        if let Some(user_id) = patch.user_id {
            self.require_user(user_id).await?;
        }
        if let Some(book_id) = patch.book_id {
            self.require_book(book_id).await?;
        }
        let fields = patch.apply(current);
        let review = self
            .store
            .update_review(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("review", id))?;
        tracing::info!(review_id = id, "Review patched");
        Ok(review)
    }

    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        if !self.store.delete_review(id).await? {
            return Err(DbError::not_found("review", id));
        }
        tracing::info!(review_id = id, "Review deleted");
        Ok(())
    }
}
