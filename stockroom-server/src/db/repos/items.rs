//! Inventory repository
//!
//! Handles item CRUD with tag regeneration on every write, plus
//! free-text search. Reads LEFT JOIN location and region so items whose
//! location or region was deleted still come back, with null names.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use super::locations::fetch_location;
use super::regions::fetch_region;
use super::{begin_write, DbError};
use crate::models::{derive_tags, rank, EntityName, Patch, Quantity, SearchQuery, Searchable};

const ITEM_SELECT: &str = r#"
    SELECT
        i.id,
        i.name,
        i.description,
        i.quantity,
        i.image_path,
        i.location_id,
        l.name AS location_name,
        i.region_id,
        r.name AS region_name,
        i.created_at,
        i.updated_at
    FROM inventory_items i
    LEFT JOIN locations l ON l.id = i.location_id
    LEFT JOIN location_regions r ON r.id = i.region_id
"#;

const SEARCH_SELECT: &str = r#"
    SELECT
        i.id,
        i.name,
        i.description,
        i.quantity,
        i.image_path,
        i.location_id,
        l.name AS location_name,
        i.region_id,
        r.name AS region_name,
        i.created_at,
        i.updated_at,
        t.tag
    FROM inventory_items i
    LEFT JOIN locations l ON l.id = i.location_id
    LEFT JOIN location_regions r ON r.id = i.region_id
    LEFT JOIN item_tags t ON t.item_id = i.id
    ORDER BY i.id, t.tag
"#;

/// Item record with denormalized location/region names
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub image_path: Option<String>,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub region_id: Option<i64>,
    pub region_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: EntityName,
    pub description: Option<String>,
    pub quantity: Quantity,
    pub image_path: Option<String>,
    pub location_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl NewItem {
    pub fn named(name: EntityName) -> Self {
        Self {
            name,
            description: None,
            quantity: Quantity::default(),
            image_path: None,
            location_id: None,
            region_id: None,
        }
    }
}

/// Partial update for an item
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub name: Patch<EntityName>,
    pub description: Patch<Option<String>>,
    pub quantity: Patch<Quantity>,
    pub image_path: Patch<Option<String>>,
    pub location_id: Patch<Option<i64>>,
    pub region_id: Patch<Option<i64>>,
}

/// List filter; both constraints apply when both are set
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemFilter {
    pub location_id: Option<i64>,
    pub region_id: Option<i64>,
}

/// Item repository
pub struct InventoryRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> InventoryRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List items in creation order.
    pub async fn list(&self, filter: ItemFilter) -> Result<Vec<InventoryItem>, DbError> {
        let mut qb = QueryBuilder::<Sqlite>::new(ITEM_SELECT);
        let mut sep = " WHERE ";

        if let Some(location_id) = filter.location_id {
            qb.push(sep).push("i.location_id = ").push_bind(location_id);
            sep = " AND ";
        }
        if let Some(region_id) = filter.region_id {
            qb.push(sep).push("i.region_id = ").push_bind(region_id);
        }
        qb.push(" ORDER BY i.id");

        let items = qb
            .build_query_as::<InventoryItem>()
            .fetch_all(self.pool)
            .await?;
        Ok(items)
    }

    pub async fn find(&self, id: i64) -> Result<Option<InventoryItem>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    pub async fn get(&self, id: i64) -> Result<InventoryItem, DbError> {
        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", id))
    }

    /// Create an item and its search tags.
    ///
    /// A given location or region must exist.
    pub async fn create(&self, new: NewItem) -> Result<InventoryItem, DbError> {
        let mut tx = begin_write(self.pool).await?;

        ensure_location(&mut tx, new.location_id).await?;
        ensure_region(&mut tx, new.region_id).await?;

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO inventory_items
                (name, description, quantity, image_path, location_id, region_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(new.name.as_str())
        .bind(new.description.as_deref())
        .bind(new.quantity.get())
        .bind(new.image_path.as_deref())
        .bind(new.location_id)
        .bind(new.region_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        let id: i64 = row.try_get("id")?;

        replace_tags(&mut tx, id, new.name.as_str(), new.description.as_deref()).await?;

        let item = fetch_item(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;

        tx.commit().await?;
        tracing::debug!(item_id = id, "inventory item created");
        Ok(item)
    }

    /// Apply a partial update and regenerate tags.
    ///
    /// Only references being set are checked; an item whose stored
    /// location was deleted can still be renamed.
    pub async fn update(&self, id: i64, patch: ItemPatch) -> Result<InventoryItem, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let current = fetch_item(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;

        if let Patch::Set(location_id) = patch.location_id {
            ensure_location(&mut tx, location_id).await?;
        }
        if let Patch::Set(region_id) = patch.region_id {
            ensure_region(&mut tx, region_id).await?;
        }

        let name = match patch.name {
            Patch::Set(name) => name.into_string(),
            Patch::Unchanged => current.name,
        };
        let description = patch.description.apply(current.description);
        let quantity = match patch.quantity {
            Patch::Set(quantity) => quantity.get(),
            Patch::Unchanged => current.quantity,
        };

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = ?, description = ?, quantity = ?, image_path = ?,
                location_id = ?, region_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&name)
        .bind(description.as_deref())
        .bind(quantity)
        .bind(patch.image_path.apply(current.image_path))
        .bind(patch.location_id.apply(current.location_id))
        .bind(patch.region_id.apply(current.region_id))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

        replace_tags(&mut tx, id, &name, description.as_deref()).await?;

        let item = fetch_item(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;

        tx.commit().await?;
        tracing::debug!(item_id = id, "inventory item updated");
        Ok(item)
    }

    /// Delete an item with its tags and return the removed row.
    pub async fn delete(&self, id: i64) -> Result<InventoryItem, DbError> {
        let mut tx = begin_write(self.pool).await?;

        let item = fetch_item(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("inventory item", id))?;

        sqlx::query("DELETE FROM item_tags WHERE item_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(item_id = id, "inventory item deleted");
        Ok(item)
    }

    /// Stored search tags for an item, sorted.
    pub async fn tags(&self, id: i64) -> Result<Vec<String>, DbError> {
        let tags: Vec<(String,)> =
            sqlx::query_as("SELECT tag FROM item_tags WHERE item_id = ? ORDER BY tag")
                .bind(id)
                .fetch_all(self.pool)
                .await?;
        Ok(tags.into_iter().map(|(tag,)| tag).collect())
    }

    /// Ranked free-text search over names, descriptions and tags.
    ///
    /// An empty query returns no results. The tag join yields one row
    /// per tag; rows are folded back into one candidate per item before
    /// ranking.
    pub async fn search(&self, raw_query: &str) -> Result<Vec<InventoryItem>, DbError> {
        let Some(query) = SearchQuery::new(raw_query) else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(SEARCH_SELECT).fetch_all(self.pool).await?;

        let mut candidates: Vec<SearchCandidate> = Vec::new();
        for row in rows {
            let item = InventoryItem::from_row(&row)?;
            let tag: Option<String> = row.try_get("tag")?;
            match candidates.last_mut() {
                Some(last) if last.item.id == item.id => last.tags.extend(tag),
                _ => candidates.push(SearchCandidate {
                    item,
                    tags: tag.into_iter().collect(),
                }),
            }
        }

        let results: Vec<InventoryItem> = rank(&query, candidates)
            .into_iter()
            .map(|c| c.item)
            .collect();
        tracing::debug!(query = query.as_str(), results = results.len(), "search");
        Ok(results)
    }
}

struct SearchCandidate {
    item: InventoryItem,
    tags: Vec<String>,
}

impl Searchable for SearchCandidate {
    fn search_id(&self) -> i64 {
        self.item.id
    }

    fn search_name(&self) -> &str {
        &self.item.name
    }

    fn search_description(&self) -> Option<&str> {
        self.item.description.as_deref()
    }

    fn search_tags(&self) -> &[String] {
        &self.tags
    }
}

pub(crate) async fn fetch_item(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<InventoryItem>, DbError> {
    let item = sqlx::query_as(&format!("{ITEM_SELECT} WHERE i.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(item)
}

async fn ensure_location(conn: &mut SqliteConnection, id: Option<i64>) -> Result<(), DbError> {
    if let Some(id) = id {
        if fetch_location(conn, id).await?.is_none() {
            return Err(DbError::not_found("location", id));
        }
    }
    Ok(())
}

async fn ensure_region(conn: &mut SqliteConnection, id: Option<i64>) -> Result<(), DbError> {
    if let Some(id) = id {
        if fetch_region(conn, id).await?.is_none() {
            return Err(DbError::not_found("region", id));
        }
    }
    Ok(())
}

/// Delete-all then re-insert the derived tags for an item.
async fn replace_tags(
    conn: &mut SqliteConnection,
    item_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query("DELETE FROM item_tags WHERE item_id = ?")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    let tags = derive_tags(name, description);
    if !tags.is_empty() {
        let mut builder = QueryBuilder::<Sqlite>::new("INSERT OR IGNORE INTO item_tags (item_id, tag) ");
        builder.push_values(tags.iter(), |mut b, tag| {
            b.push_bind(item_id).push_bind(tag);
        });
        builder.build().execute(&mut *conn).await?;
    }
    Ok(())
}
