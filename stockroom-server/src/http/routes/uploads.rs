//! Static serving of uploaded images
//!
//! Files are served straight from the uploads directory. `ServeDir`
//! refuses paths that climb out of it.

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// URL prefix for uploaded images
pub const MOUNT_PATH: &str = "/uploads";

/// Upload routes
pub fn router<S>(uploads_dir: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().nest_service(MOUNT_PATH, ServeDir::new(uploads_dir))
}
