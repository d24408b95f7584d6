//! Custom Axum extractors
//!
//! Rejections from the stock extractors are turned into `ApiError` so every
//! failure, including malformed JSON, bad query strings and non-integer ids,
//! gets the same JSON error body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;

/// Extract an integer resource id from the path
pub struct IdPath(pub i32);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<i32> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Malformed {
                message: "id must be a 32-bit integer".to_owned(),
            })?;

        Ok(Self(id))
    }
}

/// JSON body whose parse errors become 422 responses
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::Malformed {
                message: rejection.body_text(),
            })?;

        Ok(Self(value))
    }
}

/// Query string whose parse errors become 422 responses
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| ApiError::Malformed {
                message: rejection.body_text(),
            })?;

        Ok(Self(value))
    }
}
