//! Database initialization command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use stockroom_server::db::{create_pool, run_migrations};

use super::resolve_config;

/// Arguments for the init-db command
#[derive(Parser, Debug)]
pub struct InitDbArgs {
    /// SQLite database file
    #[arg(long, env = "STOCKROOM_DB")]
    pub database: Option<PathBuf>,
}

/// Create the database file and schema, then exit
pub async fn run_init_db(args: InitDbArgs) -> Result<()> {
    let config = resolve_config(args.database, None);
    let path = &config.database_path;

    let pool = create_pool(path)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    run_migrations(&pool)
        .await
        .context("Failed to apply database schema")?;
    pool.close().await;

    tracing::info!(database = %path.display(), "database initialized");
    Ok(())
}
