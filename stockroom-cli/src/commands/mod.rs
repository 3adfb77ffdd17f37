//! Command implementations for stockroom CLI

pub mod init_db;
pub mod serve;

use std::path::PathBuf;

use stockroom_server::StockroomConfig;

pub use init_db::{run_init_db, InitDbArgs};
pub use serve::{run_serve, ServeArgs};

/// Start from the environment, let explicit paths win.
pub(crate) fn resolve_config(
    database: Option<PathBuf>,
    uploads_dir: Option<PathBuf>,
) -> StockroomConfig {
    let mut config = StockroomConfig::from_env();
    if let Some(database) = database {
        config.database_path = database;
    }
    if let Some(uploads_dir) = uploads_dir {
        config.uploads_dir = uploads_dir;
    }
    config
}
