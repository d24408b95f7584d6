//! Schema migrations for the catalog tables
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so this runs on each
//! server start. Constraint names are fixed because `PgStore` maps
//! violations back to API errors by name.

use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        bio TEXT,
        birth_date DATE,
        nationality TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS books (
        id SERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        author_id INTEGER NOT NULL,
        published_date DATE,
        isbn TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        stock INTEGER NOT NULL,
        cover_image_url TEXT,
        CONSTRAINT books_author_id_fkey FOREIGN KEY (author_id)
            REFERENCES authors(id) ON DELETE CASCADE,
        CONSTRAINT books_isbn_key UNIQUE (isbn),
        CONSTRAINT books_price_check CHECK (price > 0),
        CONSTRAINT books_stock_check CHECK (stock >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        password TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email),
        CONSTRAINT users_role_check CHECK (role IN ('admin', 'user'))
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id SERIAL PRIMARY KEY,
        book_id INTEGER NOT NULL,
        user_id INTEGER NOT NULL,
        rating INTEGER NOT NULL,
        comment TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT reviews_book_id_fkey FOREIGN KEY (book_id)
            REFERENCES books(id) ON DELETE CASCADE,
        CONSTRAINT reviews_user_id_fkey FOREIGN KEY (user_id)
            REFERENCES users(id) ON DELETE CASCADE,
        CONSTRAINT reviews_book_id_user_id_key UNIQUE (book_id, user_id),
        CONSTRAINT reviews_rating_check CHECK (rating BETWEEN 1 AND 5)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS books_author_id_idx ON books (author_id)",
    "CREATE INDEX IF NOT EXISTS reviews_user_id_idx ON reviews (user_id)",
];

/// Run all catalog migrations
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running catalog migrations...");

    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = STATEMENTS.len(), "Catalog migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_created_parent_first() {
        let position = |table: &str| {
            STATEMENTS
                .iter()
                .position(|s| s.contains(&format!("CREATE TABLE IF NOT EXISTS {} ", table)))
                .unwrap_or_else(|| panic!("no statement for {}", table))
        };
        assert!(position("authors") < position("books"));
        assert!(position("books") < position("reviews"));
        assert!(position("users") < position("reviews"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn migrations_are_idempotent() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        run(&pool).await.expect("first run");
        run(&pool).await.expect("second run");
    }
}
