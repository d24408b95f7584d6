//! PostgreSQL store
//!
//! One statement per call; cascades come from `ON DELETE CASCADE`.
//! Constraint violations are translated by name (see `migrations`).

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::records::{
    Author, AuthorFields, Book, BookFields, BookSearch, BookWithAuthor, Review, ReviewFields,
    User, UserFields,
};
use super::{conflict, DbError, Store};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// A foreign key a statement may break: (constraint, referenced resource, id).
type Reference = (&'static str, &'static str, i32);

/// Store backed by a sqlx connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unique_detail(constraint: &str) -> Option<&'static str> {
    match constraint {
        "books_isbn_key" => Some(conflict::ISBN_TAKEN),
        "users_username_key" => Some(conflict::USERNAME_TAKEN),
        "users_email_key" => Some(conflict::EMAIL_TAKEN),
        "reviews_book_id_user_id_key" => Some(conflict::ALREADY_REVIEWED),
        _ => None,
    }
}

/// Translate unique / foreign-key violations into domain errors.
fn map_violation(err: sqlx::Error, resource: &'static str, refs: &[Reference]) -> DbError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                if let Some(detail) = unique_detail(constraint) {
                    return DbError::Conflict { resource, detail };
                }
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                if let Some(&(_, referenced, id)) = refs.iter().find(|r| r.0 == constraint) {
                    return DbError::not_found(referenced, id);
                }
            }
            _ => {}
        }
    }
    DbError::Sqlx(err)
}

/// `%needle%` with LIKE metacharacters escaped (used with `ESCAPE '\'`).
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn book_with_author(row: &PgRow) -> Result<BookWithAuthor, sqlx::Error> {
    Ok(BookWithAuthor {
        book: Book {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            published_date: row.try_get("published_date")?,
            isbn: row.try_get("isbn")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            cover_image_url: row.try_get("cover_image_url")?,
        },
        author: Author {
            id: row.try_get("a_id")?,
            name: row.try_get("a_name")?,
            bio: row.try_get("a_bio")?,
            birth_date: row.try_get("a_birth_date")?,
            nationality: row.try_get("a_nationality")?,
        },
    })
}

#[async_trait]
impl Store for PgStore {
    async fn insert_author(&self, fields: &AuthorFields) -> Result<Author, DbError> {
        let author: Author = sqlx::query_as(
            r#"
            INSERT INTO authors (name, bio, birth_date, nationality)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, bio, birth_date, nationality
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.bio)
        .bind(fields.birth_date)
        .bind(&fields.nationality)
        .fetch_one(&self.pool)
        .await?;

        Ok(author)
    }

    async fn list_authors(&self) -> Result<Vec<Author>, DbError> {
        let authors = sqlx::query_as(
            "SELECT id, name, bio, birth_date, nationality FROM authors ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    async fn get_author(&self, id: i32) -> Result<Option<Author>, DbError> {
        let author = sqlx::query_as(
            "SELECT id, name, bio, birth_date, nationality FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn update_author(
        &self,
        id: i32,
        fields: &AuthorFields,
    ) -> Result<Option<Author>, DbError> {
        let author = sqlx::query_as(
            r#"
            UPDATE authors
            SET name = $2, bio = $3, birth_date = $4, nationality = $5
            WHERE id = $1
            RETURNING id, name, bio, birth_date, nationality
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.bio)
        .bind(fields.birth_date)
        .bind(&fields.nationality)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn delete_author(&self, id: i32) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_book(&self, fields: &BookFields) -> Result<Book, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO books
                (title, author_id, published_date, isbn, price, stock, cover_image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, author_id, published_date, isbn, price, stock, cover_image_url
            "#,
        )
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(fields.published_date)
        .bind(&fields.isbn)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(&fields.cover_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_violation(e, "book", &[("books_author_id_fkey", "author", fields.author_id)])
        })
    }

    async fn list_books(&self) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as(
            r#"
            SELECT id, title, author_id, published_date, isbn, price, stock, cover_image_url
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn get_book(&self, id: i32) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as(
            r#"
            SELECT id, title, author_id, published_date, isbn, price, stock, cover_image_url
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn update_book(&self, id: i32, fields: &BookFields) -> Result<Option<Book>, DbError> {
        sqlx::query_as(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, published_date = $4, isbn = $5,
                price = $6, stock = $7, cover_image_url = $8
            WHERE id = $1
            RETURNING id, title, author_id, published_date, isbn, price, stock, cover_image_url
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(fields.author_id)
        .bind(fields.published_date)
        .bind(&fields.isbn)
        .bind(fields.price)
        .bind(fields.stock)
        .bind(&fields.cover_image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_violation(e, "book", &[("books_author_id_fkey", "author", fields.author_id)])
        })
    }

    async fn delete_book(&self, id: i32) -> Result<Option<Book>, DbError> {
        let book = sqlx::query_as(
            r#"
            DELETE FROM books
            WHERE id = $1
            RETURNING id, title, author_id, published_date, isbn, price, stock, cover_image_url
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    async fn books_by_author(&self, author_id: i32) -> Result<Vec<Book>, DbError> {
        let books = sqlx::query_as(
            r#"
            SELECT id, title, author_id, published_date, isbn, price, stock, cover_image_url
            FROM books
            WHERE author_id = $1
            ORDER BY id
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn search_books(&self, search: &BookSearch) -> Result<Vec<BookWithAuthor>, DbError> {
        // NULL parameter = filter not supplied
        let rows = sqlx::query(
            r#"
            SELECT
                b.id, b.title, b.author_id, b.published_date, b.isbn,
                b.price, b.stock, b.cover_image_url,
                a.id AS a_id, a.name AS a_name, a.bio AS a_bio,
                a.birth_date AS a_birth_date, a.nationality AS a_nationality
            FROM books b
            JOIN authors a ON a.id = b.author_id
            WHERE ($1::text IS NULL OR b.title ILIKE $1 ESCAPE '\')
              AND ($2::text IS NULL OR b.isbn ILIKE $2 ESCAPE '\')
              AND ($3::text IS NULL OR a.name ILIKE $3 ESCAPE '\')
            ORDER BY b.id
            "#,
        )
        .bind(search.title.as_deref().map(like_pattern))
        .bind(search.isbn.as_deref().map(like_pattern))
        .bind(search.author_name.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await?;

        let books = rows
            .iter()
            .map(book_with_author)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    async fn insert_user(&self, fields: &UserFields) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (username, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password, role
            "#,
        )
        .bind(&fields.username)
        .bind(&fields.email)
        .bind(&fields.password)
        .bind(fields.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_violation(e, "user", &[]))
    }

    async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as(
            "SELECT id, username, email, password, role FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(
            "SELECT id, username, email, password, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(
            "SELECT id, username, email, password, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as(
            "SELECT id, username, email, password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, id: i32, fields: &UserFields) -> Result<Option<User>, DbError> {
        sqlx::query_as(
            r#"
            UPDATE users
            SET username = $2, email = $3, password = $4, role = $5
            WHERE id = $1
            RETURNING id, username, email, password, role
            "#,
        )
        .bind(id)
        .bind(&fields.username)
        .bind(&fields.email)
        .bind(&fields.password)
        .bind(fields.role.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_violation(e, "user", &[]))
    }

    async fn delete_user(&self, id: i32) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_review(&self, fields: &ReviewFields) -> Result<Review, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO reviews (book_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, book_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(fields.book_id)
        .bind(fields.user_id)
        .bind(fields.rating)
        .bind(&fields.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_violation(e, "review", &review_refs(fields)))
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, DbError> {
        let reviews = sqlx::query_as(
            r#"
            SELECT id, book_id, user_id, rating, comment, created_at
            FROM reviews
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn get_review(&self, id: i32) -> Result<Option<Review>, DbError> {
        let review = sqlx::query_as(
            r#"
            SELECT id, book_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn find_review(&self, book_id: i32, user_id: i32) -> Result<Option<Review>, DbError> {
        let review = sqlx::query_as(
            r#"
            SELECT id, book_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE book_id = $1 AND user_id = $2
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(review)
    }

    async fn reviews_by_book(&self, book_id: i32) -> Result<Vec<Review>, DbError> {
        let reviews = sqlx::query_as(
            r#"
            SELECT id, book_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE book_id = $1
            ORDER BY id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn reviews_by_user(&self, user_id: i32) -> Result<Vec<Review>, DbError> {
        let reviews = sqlx::query_as(
            r#"
            SELECT id, book_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn update_review(
        &self,
        id: i32,
        fields: &ReviewFields,
    ) -> Result<Option<Review>, DbError> {
        sqlx::query_as(
            r#"
            UPDATE reviews
            SET book_id = $2, user_id = $3, rating = $4, comment = $5
            WHERE id = $1
            RETURNING id, book_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(id)
        .bind(fields.book_id)
        .bind(fields.user_id)
        .bind(fields.rating)
        .bind(&fields.comment)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_violation(e, "review", &review_refs(fields)))
    }

    async fn delete_review(&self, id: i32) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn review_refs(fields: &ReviewFields) -> [Reference; 2] {
    [
        ("reviews_book_id_fkey", "book", fields.book_id),
        ("reviews_user_id_fkey", "user", fields.user_id),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("dune"), "%dune%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }

    #[test]
    fn unique_constraints_have_details() {
        assert_eq!(unique_detail("users_email_key"), Some(conflict::EMAIL_TAKEN));
        assert_eq!(
            unique_detail("reviews_book_id_user_id_key"),
            Some(conflict::ALREADY_REVIEWED)
        );
        assert_eq!(unique_detail("authors_pkey"), None);
    }

    async fn store() -> PgStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations failed");
        PgStore::new(pool)
    }

    fn unique_suffix() -> String {
        chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .to_string()
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn duplicate_username_is_conflict() {
        let store = store().await;
        let suffix = unique_suffix();
        let name = format!("u{}", &suffix[suffix.len() - 12..]);
        let fields = |email: &str| UserFields {
            username: name.clone(),
            email: email.to_string(),
            password: "secret1".into(),
            role: Role::User,
        };

        store
            .insert_user(&fields(&format!("{}@a.com", name)))
            .await
            .expect("first insert");
        let err = store
            .insert_user(&fields(&format!("{}@b.com", name)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Conflict { detail, .. } if detail == conflict::USERNAME_TAKEN
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn dangling_author_is_not_found() {
        let store = store().await;
        let err = store
            .insert_book(&BookFields {
                title: "Orphan".into(),
                author_id: i32::MAX,
                published_date: None,
                isbn: "0000000000".into(),
                price: 1.0,
                stock: 0,
                cover_image_url: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "author", .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn author_delete_cascades() {
        let store = store().await;
        let suffix = unique_suffix();
        let isbn = suffix[suffix.len() - 13..].to_string();

        let author = store
            .insert_author(&AuthorFields {
                name: "Cascade Author".into(),
                bio: None,
                birth_date: None,
                nationality: None,
            })
            .await
            .unwrap();
        let book = store
            .insert_book(&BookFields {
                title: "Cascade Book".into(),
                author_id: author.id,
                published_date: None,
                isbn,
                price: 5.0,
                stock: 1,
                cover_image_url: None,
            })
            .await
            .unwrap();

        assert!(store.delete_author(author.id).await.unwrap());
        assert!(store.get_book(book.id).await.unwrap().is_none());
        assert!(store.reviews_by_book(book.id).await.unwrap().is_empty());
    }
}
