//! Author endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{AuthorPatch, Authors};
use crate::db::{Author, AuthorFields};
use crate::http::error::ApiError;
use crate::http::extractors::{IdPath, ValidJson};
use crate::http::server::AppState;
use crate::models::{double_option, AuthorName, ValidationError};

/// Create/replace author request
#[derive(Deserialize)]
pub struct AuthorRequest {
    pub name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

impl AuthorRequest {
    fn validate(self) -> Result<AuthorFields, ValidationError> {
        let name = AuthorName::new(&self.name)?;
        Ok(AuthorFields {
            name: name.into_string(),
            bio: self.bio,
            birth_date: self.birth_date,
            nationality: self.nationality,
        })
    }
}

/// Partial author update request
#[derive(Deserialize, Default)]
pub struct AuthorPatchRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub birth_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub nationality: Option<Option<String>>,
}

impl AuthorPatchRequest {
    fn validate(self) -> Result<AuthorPatch, ValidationError> {
        let name = self
            .name
            .map(|n| AuthorName::new(&n).map(AuthorName::into_string))
            .transpose()?;
        Ok(AuthorPatch {
            name,
            bio: self.bio,
            birth_date: self.birth_date,
            nationality: self.nationality,
        })
    }
}

/// Author response
#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub nationality: Option<String>,
}

impl From<Author> for AuthorResponse {
    fn from(a: Author) -> Self {
        Self {
            id: a.id,
            name: a.name,
            bio: a.bio,
            birth_date: a.birth_date,
            nationality: a.nationality,
        }
    }
}

/// Status for a successful author update: 202 by default, 200 when uniform.
fn update_status(state: &AppState) -> StatusCode {
    if state.uniform_responses {
        StatusCode::OK
    } else {
        StatusCode::ACCEPTED
    }
}

/// POST /authors - create an author
async fn create_author(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<AuthorRequest>,
) -> Result<(StatusCode, Json<AuthorResponse>), ApiError> {
    let fields = req.validate()?;
    let author = Authors::new(state.store.as_ref()).create(fields).await?;

    Ok((StatusCode::CREATED, Json(AuthorResponse::from(author))))
}

/// GET /authors - list all authors
async fn list_authors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AuthorResponse>>, ApiError> {
    let authors = Authors::new(state.store.as_ref()).list().await?;
    if authors.is_empty() && !state.uniform_responses {
        return Err(ApiError::no_results("no authors registered"));
    }

    Ok(Json(authors.into_iter().map(AuthorResponse::from).collect()))
}

/// GET /authors/{id}
async fn get_author(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<AuthorResponse>, ApiError> {
    let author = Authors::new(state.store.as_ref()).get(id).await?;
    Ok(Json(AuthorResponse::from(author)))
}

/// PUT /authors/{id} - replace every field
async fn replace_author(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<AuthorRequest>,
) -> Result<(StatusCode, Json<AuthorResponse>), ApiError> {
    let fields = req.validate()?;
    let author = Authors::new(state.store.as_ref()).replace(id, fields).await?;

    Ok((update_status(&state), Json(AuthorResponse::from(author))))
}

/// PATCH /authors/{id} - update supplied fields only
async fn patch_author(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<AuthorPatchRequest>,
) -> Result<(StatusCode, Json<AuthorResponse>), ApiError> {
    let patch = req.validate()?;
    let author = Authors::new(state.store.as_ref()).patch(id, patch).await?;

    Ok((update_status(&state), Json(AuthorResponse::from(author))))
}

/// DELETE /authors/{id} - cascades to the author's books and their reviews
async fn delete_author(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    Authors::new(state.store.as_ref()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Author routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authors", get(list_authors).post(create_author))
        .route("/authors/", get(list_authors).post(create_author))
        .route(
            "/authors/{id}",
            get(get_author)
                .put(replace_author)
                .patch(patch_author)
                .delete(delete_author),
        )
}
