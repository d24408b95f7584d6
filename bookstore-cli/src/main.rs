//! bookstore CLI - runs and administers the bookstore catalog service
//!
//! Subcommands:
//! - `serve`: HTTP API over PostgreSQL (or an in-memory store)
//! - `migrate`: create the catalog tables
//! - `config`: inspect the effective configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use config::FileConfig;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "bookstore",
    author,
    version,
    about = "Bookstore catalog API: authors, books, users and reviews"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file [default: ./bookstore.toml if present]
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Create or update the database schema and exit
    Migrate(commands::migrate::MigrateArgs),
    /// Inspect configuration (show, path)
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env before parsing so `env = "DATABASE_URL"` sees it
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Serve(args) => {
            let file = FileConfig::load(cli.config.as_deref())?;
            commands::run_serve(args, &file).await?
        }
        Commands::Migrate(args) => {
            let file = FileConfig::load(cli.config.as_deref())?;
            commands::run_migrate(args, &file).await?
        }
        Commands::Config(args) => config::run_config(args, cli.config.as_deref())?,
    }

    Ok(())
}
