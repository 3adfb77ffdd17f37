//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS by default
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::StockroomConfig;
use crate::storage::{FsImageStore, ImageStore};

/// Origins allowed when CORS is not permissive
const LOCALHOST_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5000",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5000",
];

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5000)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            cors_permissive: false,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Where uploaded images live
    pub images: Arc<dyn ImageStore>,
    pub config: StockroomConfig,
}

impl AppState {
    /// State backed by the filesystem image store under `config.uploads_dir`.
    pub fn new(pool: SqlitePool, config: StockroomConfig) -> Self {
        let images = Arc::new(FsImageStore::new(config.uploads_dir.clone()));
        Self {
            pool,
            images,
            config,
        }
    }

    /// Swap in another image store (tests use the in-memory one).
    pub fn with_images(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = images;
        self
    }
}

/// Build the full application router.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        let origins = LOCALHOST_ORIGINS
            .iter()
            .filter_map(|origin| origin.parse::<HeaderValue>().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let uploads_dir = state.config.uploads_dir.clone();

    Router::new()
        .merge(routes::health::router())
        .merge(routes::locations::router())
        .merge(routes::regions::router())
        .merge(routes::inventory::router())
        .merge(routes::search::router())
        .merge(routes::led::router())
        .merge(routes::uploads::router(&uploads_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&stockroom.database_path).await?;
/// run_migrations(&pool).await?;
/// run_server(pool, stockroom, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    pool: SqlitePool,
    stockroom: StockroomConfig,
    config: ServerConfig,
) -> Result<(), ServerError> {
    tracing::info!(
        database = %stockroom.database_path.display(),
        uploads = %stockroom.uploads_dir.display(),
        "stockroom config loaded"
    );
    tokio::fs::create_dir_all(&stockroom.uploads_dir).await?;

    let app = build_router(AppState::new(pool, stockroom), &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 5000);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn localhost_origins_parse() {
        for origin in LOCALHOST_ORIGINS {
            assert!(origin.parse::<HeaderValue>().is_ok(), "{origin}");
        }
    }
}
