//! Author manager

use chrono::NaiveDate;

use crate::db::{Author, AuthorFields, DbError, Store};

/// Partial author update. `None` leaves a field alone; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorPatch {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub nationality: Option<Option<String>>,
}

impl AuthorPatch {
    /// Merge onto the current row, producing the full column set to write.
    pub fn apply(self, current: Author) -> AuthorFields {
        let mut fields = AuthorFields::from(current);
        if let Some(name) = self.name {
            fields.name = name;
        }
        if let Some(bio) = self.bio {
            fields.bio = bio;
        }
        if let Some(birth_date) = self.birth_date {
            fields.birth_date = birth_date;
        }
        if let Some(nationality) = self.nationality {
            fields.nationality = nationality;
        }
        fields
    }
}

/// Author manager
pub struct Authors<'a> {
    store: &'a dyn Store,
}

impl<'a> Authors<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, fields: AuthorFields) -> Result<Author, DbError> {
        let author = self.store.insert_author(&fields).await?;
        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    /// All authors, ordered by id. May be empty; callers decide whether
    /// that is an error.
    pub async fn list(&self) -> Result<Vec<Author>, DbError> {
        self.store.list_authors().await
    }

    pub async fn get(&self, id: i32) -> Result<Author, DbError> {
        self.store
            .get_author(id)
            .await?
            .ok_or_else(|| DbError::not_found("author", id))
    }

    /// Overwrite every column, clearing omitted optional fields.
    pub async fn replace(&self, id: i32, fields: AuthorFields) -> Result<Author, DbError> {
        let author = self
            .store
            .update_author(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("author", id))?;
        tracing::info!(author_id = id, "Author replaced");
        Ok(author)
    }

    pub async fn patch(&self, id: i32, patch: AuthorPatch) -> Result<Author, DbError> {
        let current = self.get(id).await?;
        let fields = patch.apply(current);
        let author = self
            .store
            .update_author(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("author", id))?;
        tracing::info!(author_id = id, "Author patched");
        Ok(author)
    }

    /// Delete the author together with its books and their reviews.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        if !self.store.delete_author(id).await? {
            return Err(DbError::not_found("author", id));
        }
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }
}
