//! LED target resolution
//!
//! Resolves an item to the center of its region so an indicator can be
//! pointed at it. The lookups run on one connection so the item, its
//! location and its region come from the same snapshot.

use sqlx::SqlitePool;

use super::items::fetch_item;
use super::locations::{fetch_location, Location};
use super::regions::{fetch_region, Region};
use super::{DbError, InventoryItem};
use crate::models::Point;

/// Everything needed to light up an item's position
#[derive(Debug, Clone, PartialEq)]
pub struct LedTarget {
    pub item: InventoryItem,
    pub location: Location,
    pub region: Region,
    pub position: Point,
}

pub struct LedLookup<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LedLookup<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Resolve an item to its region center.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the item is missing, or its stored location or
    ///   region no longer exists
    /// - `NoLocationContext` if the item lacks a location or a region
    pub async fn resolve(&self, item_id: i64) -> Result<LedTarget, DbError> {
        let mut conn = self.pool.acquire().await?;

        let item = fetch_item(&mut conn, item_id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", item_id))?;

        let (Some(location_id), Some(region_id)) = (item.location_id, item.region_id) else {
            return Err(DbError::NoLocationContext { item_id });
        };

        let location = fetch_location(&mut conn, location_id)
            .await?
            .ok_or_else(|| DbError::not_found("location", location_id))?;
        let region = fetch_region(&mut conn, region_id)
            .await?
            .ok_or_else(|| DbError::not_found("region", region_id))?;

        let position = region.rect().center();
        Ok(LedTarget {
            item,
            location,
            region,
            position,
        })
    }
}
