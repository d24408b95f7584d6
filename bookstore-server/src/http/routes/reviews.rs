//! Review endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{ReviewPatch, Reviews};
use crate::db::{Review, ReviewFields};
use crate::http::error::ApiError;
use crate::http::extractors::{IdPath, ValidJson};
use crate::http::server::AppState;
use crate::models::{double_option, Comment, Rating, ValidationError};

fn validate_comment(comment: Option<String>) -> Result<Option<String>, ValidationError> {
    comment
        .map(|c| Comment::new(&c).map(Comment::into_string))
        .transpose()
}

/// Create/replace review request
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
}

impl ReviewRequest {
    fn validate(self) -> Result<ReviewFields, ValidationError> {
        let rating = Rating::new(self.rating)?;
        Ok(ReviewFields {
            book_id: self.book_id,
            user_id: self.user_id,
            rating: rating.value(),
            comment: validate_comment(self.comment)?,
        })
    }
}

/// Partial review update request
#[derive(Deserialize, Default)]
pub struct ReviewPatchRequest {
    pub book_id: Option<i32>,
    pub user_id: Option<i32>,
    pub rating: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub comment: Option<Option<String>>,
}

impl ReviewPatchRequest {
    fn validate(self) -> Result<ReviewPatch, ValidationError> {
        let rating = self
            .rating
            .map(|r| Rating::new(r).map(Rating::value))
            .transpose()?;
        let comment = self.comment.map(validate_comment).transpose()?;
        Ok(ReviewPatch {
            book_id: self.book_id,
            user_id: self.user_id,
            rating,
            comment,
        })
    }
}

/// Review response
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Review> for ReviewResponse {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            book_id: r.book_id,
            user_id: r.user_id,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

fn responses(reviews: Vec<Review>) -> Vec<ReviewResponse> {
    reviews.into_iter().map(ReviewResponse::from).collect()
}

/// POST /reviews - one review per (book, user)
async fn create_review(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let fields = req.validate()?;
    let review = Reviews::new(state.store.as_ref()).create(fields).await?;

    Ok((StatusCode::CREATED, Json(ReviewResponse::from(review))))
}

/// GET /reviews - list all reviews, possibly empty
async fn list_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = Reviews::new(state.store.as_ref()).list().await?;
    Ok(Json(responses(reviews)))
}

/// GET /reviews/{id}
async fn get_review(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = Reviews::new(state.store.as_ref()).get(id).await?;
    Ok(Json(ReviewResponse::from(review)))
}

/// GET /reviews/book/{id}
async fn reviews_by_book(
    State(state): State<Arc<AppState>>,
    IdPath(book_id): IdPath,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = Reviews::new(state.store.as_ref()).by_book(book_id).await?;
    Ok(Json(responses(reviews)))
}

/// GET /reviews/user/{id}
async fn reviews_by_user(
    State(state): State<Arc<AppState>>,
    IdPath(user_id): IdPath,
) -> Result<Json<Vec<ReviewResponse>>, ApiError> {
    let reviews = Reviews::new(state.store.as_ref()).by_user(user_id).await?;
    Ok(Json(responses(reviews)))
}

/// PUT /reviews/{id} - replace every field except created_at
async fn replace_review(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let fields = req.validate()?;
    let review = Reviews::new(state.store.as_ref()).replace(id, fields).await?;
    Ok(Json(ReviewResponse::from(review)))
}

/// PATCH /reviews/{id} - update supplied fields only
async fn patch_review(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<ReviewPatchRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let patch = req.validate()?;
    let review = Reviews::new(state.store.as_ref()).patch(id, patch).await?;
    Ok(Json(ReviewResponse::from(review)))
}

/// DELETE /reviews/{id}
async fn delete_review(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    Reviews::new(state.store.as_ref()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Review routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", get(list_reviews).post(create_review))
        .route("/reviews/", get(list_reviews).post(create_review))
        .route("/reviews/book/{id}", get(reviews_by_book))
        .route("/reviews/user/{id}", get(reviews_by_user))
        .route(
            "/reviews/{id}",
            get(get_review)
                .put(replace_review)
                .patch(patch_review)
                .delete(delete_review),
        )
}
