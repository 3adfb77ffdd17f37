//! Location repository
//!
//! Locations form a forest through `parent_id`. Deleting a location
//! leaves its children and items pointing at the missing id; readers
//! treat a missing parent as the end of the chain.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use super::{begin_write, DbError};
use crate::models::{EntityName, Patch};

/// Location record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which locations to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    /// Only locations without a parent
    Roots,
    /// Direct children of the given id (the id need not exist)
    ChildrenOf(i64),
}

/// Fields for a new location
#[derive(Debug, Clone)]
pub struct NewLocation {
    pub name: EntityName,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub image_path: Option<String>,
}

impl NewLocation {
    pub fn named(name: EntityName) -> Self {
        Self {
            name,
            description: None,
            parent_id: None,
            image_path: None,
        }
    }
}

/// Partial update for a location
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub name: Patch<EntityName>,
    pub description: Patch<Option<String>>,
    pub parent_id: Patch<Option<i64>>,
    pub image_path: Patch<Option<String>>,
}

/// Location repository
pub struct LocationRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LocationRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List locations in creation order.
    pub async fn list(&self, filter: LocationFilter) -> Result<Vec<Location>, DbError> {
        let locations: Vec<Location> = match filter {
            LocationFilter::All => {
                sqlx::query_as("SELECT * FROM locations ORDER BY id")
                    .fetch_all(self.pool)
                    .await?
            }
            LocationFilter::Roots => {
                sqlx::query_as("SELECT * FROM locations WHERE parent_id IS NULL ORDER BY id")
                    .fetch_all(self.pool)
                    .await?
            }
            LocationFilter::ChildrenOf(parent_id) => {
                sqlx::query_as("SELECT * FROM locations WHERE parent_id = ? ORDER BY id")
                    .bind(parent_id)
                    .fetch_all(self.pool)
                    .await?
            }
        };
        Ok(locations)
    }

    /// Get a single location, or `None` if the id does not resolve.
    pub async fn find(&self, id: i64) -> Result<Option<Location>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_location(&mut conn, id).await
    }

    /// Get a single location by id.
    pub async fn get(&self, id: i64) -> Result<Location, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("location", id))
    }

    /// Create a location. A given parent must exist.
    pub async fn create(&self, new: NewLocation) -> Result<Location, DbError> {
        let mut tx = begin_write(self.pool).await?;

        if let Some(parent_id) = new.parent_id {
            if fetch_location(&mut tx, parent_id).await?.is_none() {
                return Err(DbError::not_found("location", parent_id));
            }
        }

        let now = Utc::now();
        let location: Location = sqlx::query_as(
            r#"
            INSERT INTO locations (name, description, parent_id, image_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(new.name.as_str())
        .bind(new.description.as_deref())
        .bind(new.parent_id)
        .bind(new.image_path.as_deref())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(location_id = location.id, "location created");
        Ok(location)
    }

    /// Apply a partial update.
    ///
    /// A new parent must exist and must not be the location itself or
    /// one of its descendants.
    pub async fn update(&self, id: i64, patch: LocationPatch) -> Result<Location, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let current = fetch_location(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("location", id))?;

        if let Patch::Set(Some(parent_id)) = patch.parent_id {
            ensure_can_reparent(&mut tx, id, parent_id).await?;
        }

        let name = match patch.name {
            Patch::Set(name) => name.into_string(),
            Patch::Unchanged => current.name,
        };
        let description = patch.description.apply(current.description);
        let parent_id = patch.parent_id.apply(current.parent_id);
        let image_path = patch.image_path.apply(current.image_path);

        let location: Location = sqlx::query_as(
            r#"
            UPDATE locations
            SET name = ?, description = ?, parent_id = ?, image_path = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(parent_id)
        .bind(image_path)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(location_id = id, "location updated");
        Ok(location)
    }

    /// Hard-delete a location and return the removed row.
    ///
    /// Children and items keep their now-dangling reference.
    pub async fn delete(&self, id: i64) -> Result<Location, DbError> {
        let location: Location = sqlx::query_as("DELETE FROM locations WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("location", id))?;

        tracing::debug!(location_id = id, "location deleted");
        Ok(location)
    }

    /// Root-first path ending at the given location.
    ///
    /// Empty if the location does not exist. A parent id that no longer
    /// resolves ends the path early. A parent chain that loops fails with
    /// [`DbError::CorruptHierarchy`].
    pub async fn breadcrumbs(&self, id: i64) -> Result<Vec<Location>, DbError> {
        let mut conn = self.pool.acquire().await?;
        match fetch_location(&mut conn, id).await? {
            Some(start) => path_to_root(&mut conn, start).await,
            None => Ok(Vec::new()),
        }
    }
}

pub(crate) async fn fetch_location(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Location>, DbError> {
    let location = sqlx::query_as("SELECT * FROM locations WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(location)
}

/// Walk parent links from `start`, returning the chain root-first.
async fn path_to_root(
    conn: &mut SqliteConnection,
    start: Location,
) -> Result<Vec<Location>, DbError> {
    let mut visited = HashSet::from([start.id]);
    let mut next = start.parent_id;
    let mut path = vec![start];

    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            tracing::warn!(location_id = parent_id, "cycle in location hierarchy");
            return Err(DbError::CorruptHierarchy {
                location_id: parent_id,
            });
        }

        match fetch_location(conn, parent_id).await? {
            Some(parent) => {
                next = parent.parent_id;
                path.push(parent);
            }
            None => break,
        }
    }

    path.reverse();
    Ok(path)
}

async fn ensure_can_reparent(
    conn: &mut SqliteConnection,
    id: i64,
    parent_id: i64,
) -> Result<(), DbError> {
    if parent_id == id {
        return Err(DbError::HierarchyCycle {
            location_id: id,
            parent_id,
        });
    }

    let parent = fetch_location(conn, parent_id)
        .await?
        .ok_or_else(|| DbError::not_found("location", parent_id))?;

    let ancestors = path_to_root(conn, parent).await?;
    if ancestors.iter().any(|l| l.id == id) {
        return Err(DbError::HierarchyCycle {
            location_id: id,
            parent_id,
        });
    }
    Ok(())
}
