//! bookstore-server: HTTP catalog of authors, books, users and reviews
//!
//! Layers, bottom-up:
//! - `models`: validated newtypes for raw input
//! - `db`: the `Store` trait with PostgreSQL and in-memory implementations
//! - `catalog`: per-resource managers enforcing existence/uniqueness rules
//! - `http`: axum router, extractors and JSON error mapping

pub mod catalog;
pub mod db;
pub mod http;
pub mod models;

pub use db::{create_pool, create_pool_with_options, DbError, MemoryStore, PgStore, Store};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
