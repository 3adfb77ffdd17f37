//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Borrows the pool; one repo per request
//! - Validates referenced ids inside the writing transaction
//! - Returns the stored row after every write

pub mod locations;
pub mod regions;
pub mod items;
pub mod led;

pub use locations::{Location, LocationFilter, LocationPatch, LocationRepo, NewLocation};
pub use regions::{NewRegion, Region, RegionPatch, RegionRepo};
pub use items::{InventoryItem, InventoryRepo, ItemFilter, ItemPatch, NewItem};
pub use led::{LedLookup, LedTarget};

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::models::ValidationError;

/// Open a transaction that takes the write lock up front.
///
/// A deferred transaction that reads before writing cannot upgrade its
/// lock while another writer holds it in WAL mode; SQLite returns busy
/// without waiting. `BEGIN IMMEDIATE` waits out `busy_timeout` instead.
pub(crate) async fn begin_write(
    pool: &SqlitePool,
) -> Result<Transaction<'static, Sqlite>, DbError> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A write combined with stored values produced an invalid row.
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// The stored parent chain loops back on itself.
    #[error("location hierarchy is corrupt: cycle through location {location_id}")]
    CorruptHierarchy { location_id: i64 },

    /// A reparent would make a location its own ancestor.
    #[error("location {location_id} cannot be placed under {parent_id}: would create a cycle")]
    HierarchyCycle { location_id: i64, parent_id: i64 },

    /// The item has no location and region to point at.
    #[error("item {item_id} does not have a location with a region")]
    NoLocationContext { item_id: i64 },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}
