//! Region repository
//!
//! Regions are rectangles drawn over a location's image. Deleting one
//! does not clear `region_id` on the items that point at it.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::locations::fetch_location;
use super::{begin_write, DbError};
use crate::models::{EntityName, Patch, Rect};

/// Region record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Region {
    pub id: i64,
    pub location_id: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Region {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Fields for a new region
#[derive(Debug, Clone)]
pub struct NewRegion {
    pub location_id: i64,
    pub name: EntityName,
    pub rect: Rect,
}

/// Partial update for a region. The owning location is fixed.
#[derive(Debug, Clone, Default)]
pub struct RegionPatch {
    pub name: Patch<EntityName>,
    pub x: Patch<f64>,
    pub y: Patch<f64>,
    pub width: Patch<f64>,
    pub height: Patch<f64>,
}

/// Region repository
pub struct RegionRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RegionRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Regions of one location, in creation order.
    pub async fn list_for_location(&self, location_id: i64) -> Result<Vec<Region>, DbError> {
        let regions = sqlx::query_as(
            "SELECT * FROM location_regions WHERE location_id = ? ORDER BY id",
        )
        .bind(location_id)
        .fetch_all(self.pool)
        .await?;
        Ok(regions)
    }

    pub async fn find(&self, id: i64) -> Result<Option<Region>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_region(&mut conn, id).await
    }

    pub async fn get(&self, id: i64) -> Result<Region, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("region", id))
    }

    /// Create a region on an existing location.
    pub async fn create(&self, new: NewRegion) -> Result<Region, DbError> {
        let mut tx = begin_write(self.pool).await?;

        if fetch_location(&mut tx, new.location_id).await?.is_none() {
            return Err(DbError::not_found("location", new.location_id));
        }

        let now = Utc::now();
        let region: Region = sqlx::query_as(
            r#"
            INSERT INTO location_regions (location_id, name, x, y, width, height, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.location_id)
        .bind(new.name.as_str())
        .bind(new.rect.x)
        .bind(new.rect.y)
        .bind(new.rect.width)
        .bind(new.rect.height)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(region_id = region.id, location_id = region.location_id, "region created");
        Ok(region)
    }

    pub async fn update(&self, id: i64, patch: RegionPatch) -> Result<Region, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let current = fetch_region(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("region", id))?;

        let rect = Rect::new(
            patch.x.apply(current.x),
            patch.y.apply(current.y),
            patch.width.apply(current.width),
            patch.height.apply(current.height),
        )?;
        let name = match patch.name {
            Patch::Set(name) => name.into_string(),
            Patch::Unchanged => current.name,
        };

        let region: Region = sqlx::query_as(
            r#"
            UPDATE location_regions
            SET name = ?, x = ?, y = ?, width = ?, height = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(rect.x)
        .bind(rect.y)
        .bind(rect.width)
        .bind(rect.height)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(region_id = id, "region updated");
        Ok(region)
    }

    /// Hard-delete a region. Items keep their stale `region_id`.
    pub async fn delete(&self, id: i64) -> Result<Region, DbError> {
        let region: Region =
            sqlx::query_as("DELETE FROM location_regions WHERE id = ? RETURNING *")
                .bind(id)
                .fetch_optional(self.pool)
                .await?
                .ok_or_else(|| DbError::not_found("region", id))?;

        tracing::debug!(region_id = id, "region deleted");
        Ok(region)
    }
}

pub(crate) async fn fetch_region(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Region>, DbError> {
    let region = sqlx::query_as("SELECT * FROM location_regions WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::{LocationRepo, NewLocation};
    use crate::db::testing::test_pool;

    async fn location(pool: &SqlitePool, name: &str) -> i64 {
        LocationRepo::new(pool)
            .create(NewLocation::named(EntityName::new(name).unwrap()))
            .await
            .unwrap()
            .id
    }

    fn new_region(location_id: i64, name: &str, x: f64, y: f64, w: f64, h: f64) -> NewRegion {
        NewRegion {
            location_id,
            name: EntityName::new(name).unwrap(),
            rect: Rect::new(x, y, w, h).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let (_dir, pool) = test_pool().await;
        let shelf = location(&pool, "Shelf").await;
        let other = location(&pool, "Other").await;
        let repo = RegionRepo::new(&pool);

        let left = repo.create(new_region(shelf, "Left", 0.0, 0.0, 50.0, 80.0)).await.unwrap();
        let right = repo.create(new_region(shelf, "Right", 50.0, 0.0, 50.0, 80.0)).await.unwrap();
        repo.create(new_region(other, "Elsewhere", 1.0, 1.0, 1.0, 1.0)).await.unwrap();

        let regions = repo.list_for_location(shelf).await.unwrap();
        assert_eq!(regions, vec![left, right]);
        assert_eq!(regions[1].rect(), Rect::new(50.0, 0.0, 50.0, 80.0).unwrap());
    }

    #[tokio::test]
    async fn create_on_missing_location_fails() {
        let (_dir, pool) = test_pool().await;
        let err = RegionRepo::new(&pool)
            .create(new_region(12, "Ghost", 0.0, 0.0, 1.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "location", .. }));
    }

    #[tokio::test]
    async fn negative_coordinates_are_stored() {
        let (_dir, pool) = test_pool().await;
        let shelf = location(&pool, "Shelf").await;

        let region = RegionRepo::new(&pool)
            .create(new_region(shelf, "Offscreen", -10.0, -5.5, 0.0, -3.0))
            .await
            .unwrap();
        assert_eq!(region.x, -10.0);
        assert_eq!(region.height, -3.0);
    }

    #[tokio::test]
    async fn update_patches_fields() {
        let (_dir, pool) = test_pool().await;
        let shelf = location(&pool, "Shelf").await;
        let repo = RegionRepo::new(&pool);

        let region = repo.create(new_region(shelf, "Top", 0.0, 0.0, 10.0, 10.0)).await.unwrap();
        let updated = repo
            .update(
                region.id,
                RegionPatch {
                    width: Patch::Set(25.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Top");
        assert_eq!(updated.width, 25.0);
        assert_eq!(updated.height, 10.0);
    }

    #[tokio::test]
    async fn update_rejects_overflowing_center() {
        let (_dir, pool) = test_pool().await;
        let shelf = location(&pool, "Shelf").await;
        let repo = RegionRepo::new(&pool);

        let region = repo.create(new_region(shelf, "Wide", 1e308, 0.0, 1.0, 1.0)).await.unwrap();
        let err = repo
            .update(
                region.id,
                RegionPatch {
                    width: Patch::Set(1e308),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Invalid(_)));

        // Stored row is untouched
        assert_eq!(repo.get(region.id).await.unwrap().width, 1.0);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (_dir, pool) = test_pool().await;
        let shelf = location(&pool, "Shelf").await;
        let repo = RegionRepo::new(&pool);

        let region = repo.create(new_region(shelf, "Top", 0.0, 0.0, 10.0, 10.0)).await.unwrap();
        repo.delete(region.id).await.unwrap();

        assert!(matches!(
            repo.get(region.id).await.unwrap_err(),
            DbError::NotFound { resource: "region", .. }
        ));
        assert!(matches!(
            repo.delete(region.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
