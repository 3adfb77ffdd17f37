//! HTTP server command
//!
//! Opens (and if needed creates) the database, applies the schema, and
//! runs the API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use stockroom_server::db::{create_pool, run_migrations};
use stockroom_server::http::{run_server, ServerConfig};

use super::resolve_config;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// SQLite database file
    #[arg(long, env = "STOCKROOM_DB")]
    pub database: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long, env = "STOCKROOM_UPLOADS")]
    pub uploads_dir: Option<PathBuf>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let stockroom = resolve_config(args.database, args.uploads_dir);

    tracing::info!("Starting stockroom server on {}", args.bind);

    let pool = create_pool(&stockroom.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                stockroom.database_path.display()
            )
        })?;
    run_migrations(&pool)
        .await
        .context("Failed to apply database schema")?;

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    // Run server (blocks until shutdown)
    run_server(pool, stockroom, config)
        .await
        .context("Server error")?;

    Ok(())
}
