//! stockroom-server: inventory tracking over HTTP
//!
//! Keeps a hierarchy of storage locations, rectangular regions drawn on
//! them, and the items stored there. Items are searchable by name,
//! description and derived tags, and resolve to the center of their
//! region for an indicator LED.

pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod storage;

pub use config::StockroomConfig;
pub use http::{build_router, run_server, AppState, ServerConfig};
pub use storage::{FsImageStore, ImageStore, MemoryImageStore};
