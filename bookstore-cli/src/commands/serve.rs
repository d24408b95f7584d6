//! HTTP server command
//!
//! Picks the store (PostgreSQL or in-memory), runs migrations and serves
//! until Ctrl+C / SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bookstore_server::db::{create_pool_with_options, migrations, MemoryStore, PgStore, Store};
use bookstore_server::run_server;

use crate::config::{FileConfig, ServerArgs, Settings};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub server: ServerArgs,
}

async fn open_store(settings: &Settings) -> Result<Arc<dyn Store>> {
    if settings.memory {
        tracing::warn!("Using in-memory store - data is lost on shutdown");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let database_url = settings.database_url.as_deref().context(
        "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, .env, \
         or [server] database_url in bookstore.toml (or use --memory)",
    )?;

    let pool = create_pool_with_options(database_url, settings.max_connections)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    Ok(Arc::new(PgStore::new(pool)))
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, file: &FileConfig) -> Result<()> {
    let settings = Settings::resolve(&args.server, file);
    tracing::info!(
        bind = %settings.bind,
        memory = settings.memory,
        uniform_responses = settings.uniform_responses,
        "Starting bookstore server"
    );

    let store = open_store(&settings).await?;

    // Run server (blocks until shutdown)
    run_server(store, settings.server_config())
        .await
        .context("Server error")?;

    Ok(())
}
