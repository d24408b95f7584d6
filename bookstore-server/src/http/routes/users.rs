//! User endpoints
//!
//! Passwords are accepted on write and never returned.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{UserPatch, Users};
use crate::db::{User, UserFields};
use crate::http::error::ApiError;
use crate::http::extractors::{IdPath, ValidJson};
use crate::http::server::AppState;
use crate::models::{Email, Password, Role, Username, ValidationError};

/// Create/replace user request; `role` defaults to `user`
#[derive(Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl UserRequest {
    fn validate(self) -> Result<UserFields, ValidationError> {
        let username = Username::new(&self.username)?;
        let email = Email::new(&self.email)?;
        let password = Password::new(&self.password)?;
        Ok(UserFields {
            username: username.into_string(),
            email: email.into_string(),
            password: password.into_string(),
            role: self.role,
        })
    }
}

/// Partial user update request
#[derive(Deserialize, Default)]
pub struct UserPatchRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserPatchRequest {
    fn validate(self) -> Result<UserPatch, ValidationError> {
        Ok(UserPatch {
            username: self
                .username
                .map(|s| Username::new(&s).map(Username::into_string))
                .transpose()?,
            email: self
                .email
                .map(|s| Email::new(&s).map(Email::into_string))
                .transpose()?,
            password: self
                .password
                .map(|s| Password::new(&s).map(Password::into_string))
                .transpose()?,
            role: self.role,
        })
    }
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
        }
    }
}

/// POST /users - register a user
async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let fields = req.validate()?;
    let user = Users::new(state.store.as_ref()).create(fields).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /users - list all users, possibly empty
async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = Users::new(state.store.as_ref()).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<UserResponse>, ApiError> {
    let user = Users::new(state.store.as_ref()).get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/{id} - replace every field
async fn replace_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let fields = req.validate()?;
    let user = Users::new(state.store.as_ref()).replace(id, fields).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PATCH /users/{id} - update supplied fields only
async fn patch_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<UserPatchRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let patch = req.validate()?;
    let user = Users::new(state.store.as_ref()).patch(id, patch).await?;
    Ok(Json(UserResponse::from(user)))
}

/// DELETE /users/{id} - cascades to the user's reviews
async fn delete_user(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    Users::new(state.store.as_ref()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::testing::{app, create, send};
    use axum::http::Method;
    use serde_json::json;

    fn alice() -> serde_json::Value {
        json!({"username": "alice", "email": "a@x.com", "password": "secret1"})
    }

    #[tokio::test]
    async fn create_defaults_role_and_hides_password() {
        let (status, body) = send(&app(), Method::POST, "/users/", Some(alice())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["role"], "user");
        assert!(body["id"].is_number());
        assert!(body.get("password").is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_409() {
        let app = app();
        create(&app, "/users", alice()).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({"username": "alice", "email": "other@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "username already exists");
    }

    #[tokio::test]
    async fn duplicate_email_is_409() {
        let app = app();
        create(&app, "/users", alice()).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/users",
            Some(json!({"username": "bob", "email": "a@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "email already registered");
    }

    #[tokio::test]
    async fn invalid_input_is_422() {
        let app = app();
        let cases = [
            json!({"username": "al", "email": "a@x.com", "password": "secret1"}),
            json!({"username": "al ice", "email": "a@x.com", "password": "secret1"}),
            json!({"username": "alice", "email": "not-an-email", "password": "secret1"}),
            json!({"username": "alice", "email": "a@x.com", "password": "123"}),
            json!({"username": "alice", "email": "a@x.com", "password": "secret1", "role": "root"}),
        ];
        for body in cases {
            let (status, _) = send(&app, Method::POST, "/users", Some(body.clone())).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "accepted {}", body);
        }
    }

    #[tokio::test]
    async fn empty_list_is_200() {
        let (status, body) = send(&app(), Method::GET, "/users/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn put_without_role_resets_to_user() {
        let app = app();
        let id = create(
            &app,
            "/users",
            json!({"username": "root", "email": "r@x.com", "password": "secret1", "role": "admin"}),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/users/{}", id),
            Some(json!({"username": "root", "email": "r@x.com", "password": "secret2"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "user");
    }

    #[tokio::test]
    async fn patch_to_taken_username_is_409() {
        let app = app();
        create(&app, "/users", alice()).await;
        let bob = create(
            &app,
            "/users",
            json!({"username": "bob", "email": "b@x.com", "password": "secret1"}),
        )
        .await;

        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/users/{}", bob),
            Some(json!({"username": "alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn patch_changes_only_supplied_fields() {
        let app = app();
        let id = create(&app, "/users", alice()).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/users/{}", id),
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "admin");
        assert_eq!(body["username"], "alice");
        assert_eq!(body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn delete_user_is_204_then_404() {
        let app = app();
        let id = create(&app, "/users", alice()).await;
        let uri = format!("/users/{}", id);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
