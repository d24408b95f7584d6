//! User manager
//!
//! Usernames and emails are unique. Checks run before the write so the
//! caller learns which key collided.

use crate::db::{conflict, DbError, Store, User, UserFields};
use crate::models::Role;

/// Partial user update; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply(self, current: User) -> UserFields {
        let mut fields = UserFields::from(current);
        if let Some(username) = self.username {
            fields.username = username;
        }
        if let Some(email) = self.email {
            fields.email = email;
        }
        if let Some(password) = self.password {
            fields.password = password;
        }
        if let Some(role) = self.role {
            fields.role = role;
        }
        fields
    }
}

/// User manager
pub struct Users<'a> {
    store: &'a dyn Store,
}

impl<'a> Users<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Conflict if `username` belongs to a user other than `except`.
    async fn ensure_username_free(&self, username: &str, except: Option<i32>) -> Result<(), DbError> {
        match self.store.find_user_by_username(username).await? {
            Some(other) if Some(other.id) != except => Err(DbError::Conflict {
                resource: "user",
                detail: conflict::USERNAME_TAKEN,
            }),
            _ => Ok(()),
        }
    }

    /// Conflict if `email` belongs to a user other than `except`.
    async fn ensure_email_free(&self, email: &str, except: Option<i32>) -> Result<(), DbError> {
        match self.store.find_user_by_email(email).await? {
            Some(other) if Some(other.id) != except => Err(DbError::Conflict {
                resource: "user",
                detail: conflict::EMAIL_TAKEN,
            }),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, fields: UserFields) -> Result<User, DbError> {
        self.ensure_username_free(&fields.username, None).await?;
        self.ensure_email_free(&fields.email, None).await?;
        let user = self.store.insert_user(&fields).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, DbError> {
        self.store.list_users().await
    }

    pub async fn get(&self, id: i32) -> Result<User, DbError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn replace(&self, id: i32, fields: UserFields) -> Result<User, DbError> {
        self.get(id).await?;
        self.ensure_username_free(&fields.username, Some(id)).await?;
        self.ensure_email_free(&fields.email, Some(id)).await?;
        let user = self
            .store
            .update_user(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))?;
        tracing::info!(user_id = id, "User replaced");
        Ok(user)
    }

    pub async fn patch(&self, id: i32, patch: UserPatch) -> Result<User, DbError> {
        let current = self.get(id).await?;
        if let Some(username) = &patch.username {
            self.ensure_username_free(username, Some(id)).await?;
        }
        if let Some(email) = &patch.email {
            self.ensure_email_free(email, Some(id)).await?;
        }
        let fields = patch.apply(current);
        let user = self
            .store
            .update_user(id, &fields)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))?;
        tracing::info!(user_id = id, "User patched");
        Ok(user)
    }

    /// Delete the user and their reviews.
    pub async fn delete(&self, id: i32) -> Result<(), DbError> {
        if !self.store.delete_user(id).await? {
            return Err(DbError::not_found("user", id));
        }
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn same_username_different_email_conflicts() {
        let store = MemoryStore::new();
        let users = Users::new(&store);
        users.create(fixtures::user("alice")).await.unwrap();

        let mut again = fixtures::user("alice");
        again.email = "alice2@example.com".into();
        let err = users.create(again).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { detail, .. } if detail == conflict::USERNAME_TAKEN));
    }

    #[tokio::test]
    async fn replace_may_keep_own_username() {
        let store = MemoryStore::new();
        let users = Users::new(&store);
        let alice = users.create(fixtures::user("alice")).await.unwrap();

        let mut fields = fixtures::user("alice");
        fields.role = Role::Admin;
        let updated = users.replace(alice.id, fields).await.unwrap();
        assert_eq!(updated.role, Role::Admin);
    }

    #[tokio::test]
    async fn replace_rejects_someone_elses_email() {
        let store = MemoryStore::new();
        let users = Users::new(&store);
        let alice = users.create(fixtures::user("alice")).await.unwrap();
        users.create(fixtures::user("bob")).await.unwrap();

        let mut fields = fixtures::user("alice");
        fields.email = "bob@example.com".into();
        let err = users.replace(alice.id, fields).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { detail, .. } if detail == conflict::EMAIL_TAKEN));
    }

    #[tokio::test]
    async fn patch_checks_only_supplied_keys() {
        let store = MemoryStore::new();
        let users = Users::new(&store);
        let alice = users.create(fixtures::user("alice")).await.unwrap();
        users.create(fixtures::user("bob")).await.unwrap();

        let patched = users
            .patch(
                alice.id,
                UserPatch {
                    password: Some("new-secret".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.username, "alice");
        assert_eq!(patched.password, "new-secret");

        let err = users
            .patch(
                alice.id,
                UserPatch {
                    username: Some("bob".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn patch_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let err = Users::new(&store)
            .patch(3, UserPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }
}
