//! Database layer - connection pool and repositories
//!
//! # Design Principles
//!
//! - Connection pool - no Arc<Mutex<Connection>>
//! - Read queries LEFT JOIN location/region names - no N+1 queries
//! - Foreign ids are checked inside the writing transaction
//! - Deletes never cascade; stale references are tolerated on read

pub mod pool;
pub mod repos;

pub use pool::{create_pool, run_migrations};
pub use repos::*;
