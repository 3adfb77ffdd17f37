//! Stockroom configuration - paths and environment loading
//!
//! Configuration is loaded from environment variables:
//! - `STOCKROOM_DB`: SQLite database file (default: data/inventory.db)
//! - `STOCKROOM_UPLOADS`: Directory for uploaded images (default: public/uploads)

use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "data/inventory.db";
pub const DEFAULT_UPLOADS_DIR: &str = "public/uploads";

/// Where the service keeps its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockroomConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Uploaded images, served under `/uploads`
    pub uploads_dir: PathBuf,
}

impl StockroomConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let database_path = std::env::var("STOCKROOM_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));
        let uploads_dir = std::env::var("STOCKROOM_UPLOADS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOADS_DIR));

        Self {
            database_path,
            uploads_dir,
        }
    }

    /// Keep all state under one directory (for testing)
    pub fn with_root(root: &Path) -> Self {
        Self {
            database_path: root.join("inventory.db"),
            uploads_dir: root.join("uploads"),
        }
    }
}

impl Default for StockroomConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_root_places_everything_under_root() {
        let config = StockroomConfig::with_root(Path::new("/tmp/stock"));

        assert_eq!(config.database_path, PathBuf::from("/tmp/stock/inventory.db"));
        assert_eq!(config.uploads_dir, PathBuf::from("/tmp/stock/uploads"));
    }
}
