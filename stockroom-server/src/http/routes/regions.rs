//! Region endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::SuccessResponse;
use crate::db::repos::{NewRegion, Region, RegionPatch, RegionRepo};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::{EntityName, Patch, Rect};

/// Create region request
#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Update region request; absent fields are left alone
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRegionRequest {
    pub name: Patch<String>,
    pub x: Patch<f64>,
    pub y: Patch<f64>,
    pub width: Patch<f64>,
    pub height: Patch<f64>,
}

/// Region response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionResponse {
    pub id: i64,
    pub location_id: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Region> for RegionResponse {
    fn from(r: Region) -> Self {
        Self {
            id: r.id,
            location_id: r.location_id,
            name: r.name,
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// GET /api/locations/{id}/regions
async fn list_regions(
    State(state): State<Arc<AppState>>,
    ValidId(location_id): ValidId,
) -> Result<Json<Vec<RegionResponse>>, ApiError> {
    let regions = RegionRepo::new(&state.pool)
        .list_for_location(location_id)
        .await?;
    Ok(Json(regions.into_iter().map(RegionResponse::from).collect()))
}

/// POST /api/locations/{id}/regions - draw a region on a location
async fn create_region(
    State(state): State<Arc<AppState>>,
    ValidId(location_id): ValidId,
    Json(req): Json<CreateRegionRequest>,
) -> Result<(StatusCode, Json<RegionResponse>), ApiError> {
    let new = NewRegion {
        location_id,
        name: EntityName::new(&req.name)?,
        rect: Rect::new(req.x, req.y, req.width, req.height)?,
    };
    let region = RegionRepo::new(&state.pool).create(new).await?;

    Ok((StatusCode::CREATED, Json(RegionResponse::from(region))))
}

/// GET /api/regions/{id}
async fn get_region(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<RegionResponse>, ApiError> {
    let region = RegionRepo::new(&state.pool).get(id).await?;
    Ok(Json(RegionResponse::from(region)))
}

/// PUT /api/regions/{id}
async fn update_region(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    Json(req): Json<UpdateRegionRequest>,
) -> Result<Json<RegionResponse>, ApiError> {
    let patch = RegionPatch {
        name: req.name.try_map(|n| EntityName::new(&n))?,
        x: req.x,
        y: req.y,
        width: req.width,
        height: req.height,
    };
    let region = RegionRepo::new(&state.pool).update(id, patch).await?;
    Ok(Json(RegionResponse::from(region)))
}

/// DELETE /api/regions/{id} - items keep their stale region id
async fn delete_region(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<SuccessResponse>, ApiError> {
    RegionRepo::new(&state.pool).delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Region routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/locations/{id}/regions",
            get(list_regions).post(create_region),
        )
        .route(
            "/api/regions/{id}",
            get(get_region).put(update_region).delete(delete_region),
        )
}
