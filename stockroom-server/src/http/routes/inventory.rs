//! Inventory item endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{discard_image, image_url, save_upload, SuccessResponse};
use crate::db::repos::{InventoryItem, InventoryRepo, ItemFilter, ItemPatch, NewItem};
use crate::http::error::ApiError;
use crate::http::extractors::{FormFields, ImageUpload, ValidId, WithImage};
use crate::http::server::AppState;
use crate::models::{EntityName, Patch, Quantity};

/// Query for GET /api/inventory
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsQuery {
    pub location_id: Option<i64>,
    pub region_id: Option<i64>,
}

/// Create item request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub location_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl FormFields for CreateItemRequest {
    const INTEGER_FIELDS: &'static [&'static str] = &["quantity", "locationId", "regionId"];
}

/// Update item request; absent fields are left alone
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateItemRequest {
    pub name: Patch<String>,
    pub description: Patch<Option<String>>,
    pub quantity: Patch<i64>,
    pub location_id: Patch<Option<i64>>,
    pub region_id: Patch<Option<i64>>,
}

impl FormFields for UpdateItemRequest {
    const INTEGER_FIELDS: &'static [&'static str] = &["quantity", "locationId", "regionId"];
}

/// Item response, denormalized with location and region names
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub image_path: Option<String>,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub region_id: Option<i64>,
    pub region_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<InventoryItem> for ItemResponse {
    fn from(i: InventoryItem) -> Self {
        Self {
            id: i.id,
            name: i.name,
            description: i.description,
            quantity: i.quantity,
            image_path: image_url(i.image_path),
            location_id: i.location_id,
            location_name: i.location_name,
            region_id: i.region_id,
            region_name: i.region_name,
            created_at: i.created_at.to_rfc3339(),
            updated_at: i.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/inventory - list, optionally by location and/or region
async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let filter = ItemFilter {
        location_id: query.location_id,
        region_id: query.region_id,
    };
    let items = InventoryRepo::new(&state.pool).list(filter).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /api/inventory - create an item, JSON or multipart with `image`
async fn create_item(
    State(state): State<Arc<AppState>>,
    WithImage { body: req, image }: WithImage<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let quantity = match req.quantity {
        Some(q) => Quantity::new(q)?,
        None => Quantity::default(),
    };
    let name = EntityName::new(&req.name)?;
    let image_path = save_upload(state.images.as_ref(), image).await?;

    let new = NewItem {
        description: req.description,
        quantity,
        image_path: image_path.clone(),
        location_id: req.location_id,
        region_id: req.region_id,
        ..NewItem::named(name)
    };
    let item = match InventoryRepo::new(&state.pool).create(new).await {
        Ok(item) => item,
        Err(e) => {
            discard_image(state.images.as_ref(), image_path.as_deref()).await;
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// GET /api/inventory/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = InventoryRepo::new(&state.pool).get(id).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// PUT /api/inventory/{id} - partial update; a multipart `image` replaces the old one
async fn update_item(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    WithImage { body: req, image }: WithImage<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, ApiError> {
    let name = req.name.try_map(|n| EntityName::new(&n))?;
    let quantity = req.quantity.try_map(Quantity::new)?;
    let repo = InventoryRepo::new(&state.pool);

    let previous = match image {
        Some(_) => repo.get(id).await?.image_path,
        None => None,
    };
    let stored = save_upload(state.images.as_ref(), image).await?;

    let patch = ItemPatch {
        name,
        description: req.description,
        quantity,
        image_path: match &stored {
            Some(reference) => Patch::Set(Some(reference.clone())),
            None => Patch::Unchanged,
        },
        location_id: req.location_id,
        region_id: req.region_id,
    };
    let item = match repo.update(id, patch).await {
        Ok(item) => item,
        Err(e) => {
            discard_image(state.images.as_ref(), stored.as_deref()).await;
            return Err(e.into());
        }
    };

    if stored.is_some() {
        discard_image(state.images.as_ref(), previous.as_deref()).await;
    }
    Ok(Json(ItemResponse::from(item)))
}

/// DELETE /api/inventory/{id} - delete the item, its tags and image
async fn delete_item(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<SuccessResponse>, ApiError> {
    let item = InventoryRepo::new(&state.pool).delete(id).await?;
    discard_image(state.images.as_ref(), item.image_path.as_deref()).await;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/inventory/{id}/image - replace the item image
async fn upload_item_image(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    upload: ImageUpload,
) -> Result<Json<ItemResponse>, ApiError> {
    let repo = InventoryRepo::new(&state.pool);
    let previous = repo.get(id).await?.image_path;

    let reference = state.images.save(&upload.file_name, &upload.bytes).await?;
    let patch = ItemPatch {
        image_path: Patch::Set(Some(reference.clone())),
        ..Default::default()
    };
    let item = match repo.update(id, patch).await {
        Ok(item) => item,
        Err(e) => {
            discard_image(state.images.as_ref(), Some(&reference)).await;
            return Err(e.into());
        }
    };

    discard_image(state.images.as_ref(), previous.as_deref()).await;
    Ok(Json(ItemResponse::from(item)))
}

/// Inventory routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/inventory", get(list_items).post(create_item))
        .route(
            "/api/inventory/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/inventory/{id}/image", post(upload_item_image))
}
