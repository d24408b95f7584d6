//! Book endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::authors::AuthorResponse;
use crate::catalog::Books;
use crate::db::{Book, BookFields, BookSearch, BookWithAuthor};
use crate::http::error::ApiError;
use crate::http::extractors::{IdPath, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::models::{BookTitle, Isbn, Price, Stock, ValidationError};

/// Create/replace book request
#[derive(Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author_id: i32,
    pub published_date: Option<NaiveDate>,
    pub isbn: String,
    pub price: f64,
    pub stock: i32,
    pub cover_image_url: Option<String>,
}

impl BookRequest {
    fn validate(self) -> Result<BookFields, ValidationError> {
        let title = BookTitle::new(&self.title)?;
        let isbn = Isbn::new(&self.isbn)?;
        let price = Price::new(self.price)?;
        let stock = Stock::new(self.stock)?;
        Ok(BookFields {
            title: title.into_string(),
            author_id: self.author_id,
            published_date: self.published_date,
            isbn: isbn.into_string(),
            price: price.value(),
            stock: stock.value(),
            cover_image_url: self.cover_image_url,
        })
    }
}

/// Search query parameters; empty values are ignored
#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author_name: Option<String>,
}

impl From<SearchParams> for BookSearch {
    fn from(p: SearchParams) -> Self {
        BookSearch::new(p.title, p.isbn, p.author_name)
    }
}

/// Book response
#[derive(Debug, Serialize)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub published_date: Option<NaiveDate>,
    pub isbn: String,
    pub price: f64,
    pub stock: i32,
    pub cover_image_url: Option<String>,
}

impl From<Book> for BookResponse {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            title: b.title,
            author_id: b.author_id,
            published_date: b.published_date,
            isbn: b.isbn,
            price: b.price,
            stock: b.stock,
            cover_image_url: b.cover_image_url,
        }
    }
}

/// Book response with its author embedded
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    #[serde(flatten)]
    pub book: BookResponse,
    pub author: AuthorResponse,
}

impl From<BookWithAuthor> for BookDetailResponse {
    fn from(b: BookWithAuthor) -> Self {
        Self {
            book: BookResponse::from(b.book),
            author: AuthorResponse::from(b.author),
        }
    }
}

fn details(books: Vec<BookWithAuthor>) -> Vec<BookDetailResponse> {
    books.into_iter().map(BookDetailResponse::from).collect()
}

/// POST /books - create a book for an existing author
async fn create_book(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let fields = req.validate()?;
    let book = Books::new(state.store.as_ref()).create(fields).await?;

    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// GET /books - list all books, possibly empty
async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = Books::new(state.store.as_ref()).list().await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/search - filter by title, isbn and author name
async fn search_books(
    State(state): State<Arc<AppState>>,
    ValidQuery(params): ValidQuery<SearchParams>,
) -> Result<Json<Vec<BookDetailResponse>>, ApiError> {
    let search = BookSearch::from(params);
    let found = Books::new(state.store.as_ref()).search(&search).await?;
    if found.is_empty() {
        return Err(ApiError::no_results("no books found matching the criteria"));
    }

    Ok(Json(details(found)))
}

/// GET /books/author/{id} - books by one author
async fn books_by_author(
    State(state): State<Arc<AppState>>,
    IdPath(author_id): IdPath,
) -> Result<Json<Vec<BookDetailResponse>>, ApiError> {
    let books = Books::new(state.store.as_ref()).by_author(author_id).await?;
    Ok(Json(details(books)))
}

/// GET /books/{id}
async fn get_book(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let book = Books::new(state.store.as_ref()).get(id).await?;
    Ok(Json(BookDetailResponse::from(book)))
}

/// PUT /books/{id} - replace every field
async fn replace_book(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidJson(req): ValidJson<BookRequest>,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let fields = req.validate()?;
    let book = Books::new(state.store.as_ref()).replace(id, fields).await?;
    Ok(Json(BookDetailResponse::from(book)))
}

/// DELETE /books/{id} - returns the deleted book (204 when uniform)
async fn delete_book(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<Response, ApiError> {
    let book = Books::new(state.store.as_ref()).delete(id).await?;
    if state.uniform_responses {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(BookResponse::from(book)).into_response())
}

/// Book routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/", get(list_books).post(create_book))
        .route("/books/search", get(search_books))
        .route("/books/author/{id}", get(books_by_author))
        .route(
            "/books/{id}",
            get(get_book).put(replace_book).delete(delete_book),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::routes::testing::{app, create, send, uniform_app};
    use axum::http::Method;
    use axum::Router;
    use serde_json::{json, Value};

    fn book_body(author_id: i64, title: &str, isbn: &str) -> Value {
        json!({
            "title": title,
            "author_id": author_id,
            "published_date": "1922-01-01",
            "isbn": isbn,
            "price": 12.5,
            "stock": 3,
            "cover_image_url": null
        })
    }

    async fn seed_author(app: &Router, name: &str) -> i64 {
        create(app, "/authors", json!({"name": name})).await
    }

    #[test]
    fn isbn_with_letter_rejected_before_length() {
        let req = BookRequest {
            title: "Desolación".into(),
            author_id: 1,
            published_date: None,
            isbn: "12X".into(),
            price: 1.0,
            stock: 0,
            cover_image_url: None,
        };
        assert!(matches!(
            req.validate().unwrap_err(),
            ValidationError::InvalidFormat { field: "isbn", .. }
        ));
    }

    #[tokio::test]
    async fn create_with_missing_author_is_404_and_stores_nothing() {
        let app = app();
        let (status, _) = send(
            &app,
            Method::POST,
            "/books/",
            Some(book_body(999, "Desolación", "1234567890")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, Method::GET, "/books/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn invalid_fields_are_422() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;

        let mut body = book_body(author, "Desolación", "1234567890");
        body["price"] = json!(0);
        let (status, _) = send(&app, Method::POST, "/books", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let mut body = book_body(author, "Desolación", "1234567890");
        body["stock"] = json!(-1);
        let (status, _) = send(&app, Method::POST, "/books", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            Method::POST,
            "/books",
            Some(book_body(author, "Desolación", "12345abc90")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn duplicate_isbn_is_409() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/books",
            Some(book_body(author, "Ternura", "1234567890")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn get_embeds_author() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        let id = create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Desolación");
        assert_eq!(body["author"]["name"], "Gabriela Mistral");
        assert_eq!(body["published_date"], "1922-01-01");
    }

    #[tokio::test]
    async fn put_to_missing_author_is_404() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        let id = create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/books/{}", id),
            Some(book_body(999, "Desolación", "1234567890")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_keeping_own_isbn_succeeds() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        let id = create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/books/{}", id),
            Some(book_body(author, "Desolación (2nd ed.)", "1234567890")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Desolación (2nd ed.)");
    }

    #[tokio::test]
    async fn delete_returns_deleted_book() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        let id = create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);
        assert_eq!(body["isbn"], "1234567890");

        let (status, _) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_is_204_when_uniform() {
        let app = uniform_app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        let id = create(&app, "/books", book_body(author, "Desolación", "1234567890")).await;

        let (status, body) = send(&app, Method::DELETE, &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn books_by_author_requires_author() {
        let app = app();
        let (status, _) = send(&app, Method::GET, "/books/author/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let author = seed_author(&app, "Gabriela Mistral").await;
        let (status, body) =
            send(&app, Method::GET, &format!("/books/author/{}", author), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn search_matches_case_insensitively_across_filters() {
        let app = app();
        let mistral = seed_author(&app, "Gabriela Mistral").await;
        let neruda = seed_author(&app, "Pablo Neruda").await;
        create(&app, "/books", book_body(mistral, "Desolación", "1111111111")).await;
        create(&app, "/books", book_body(neruda, "Canto General", "2222222222")).await;

        let (status, body) =
            send(&app, Method::GET, "/books/search?author_name=NERUDA", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["title"], "Canto General");
        assert_eq!(body[0]["author"]["name"], "Pablo Neruda");

        let (status, body) = send(
            &app,
            Method::GET,
            "/books/search?title=deso&isbn=1111",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn search_without_matches_is_404() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        create(&app, "/books", book_body(author, "Desolación", "1111111111")).await;

        let (status, body) = send(&app, Method::GET, "/books/search?title=zzz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn search_wildcards_match_literally() {
        let app = app();
        let author = seed_author(&app, "Gabriela Mistral").await;
        create(&app, "/books", book_body(author, "Desolación", "1111111111")).await;

        let (status, _) = send(&app, Method::GET, "/books/search?title=%25", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_with_repeated_filter_is_422() {
        let app = app();
        let (status, body) =
            send(&app, Method::GET, "/books/search?title=a&title=b", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "validation_error");
    }
}
