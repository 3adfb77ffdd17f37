//! LED target endpoint

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::repos::{LedLookup, LedTarget};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::http::server::AppState;
use crate::models::Point;

#[derive(Debug, Serialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RegionRef {
    pub id: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// LED target response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedResponse {
    pub item: NamedRef,
    pub location: NamedRef,
    pub region: RegionRef,
    pub led_position: Point,
}

impl From<LedTarget> for LedResponse {
    fn from(t: LedTarget) -> Self {
        Self {
            item: NamedRef {
                id: t.item.id,
                name: t.item.name,
            },
            location: NamedRef {
                id: t.location.id,
                name: t.location.name,
            },
            region: RegionRef {
                id: t.region.id,
                name: t.region.name,
                x: t.region.x,
                y: t.region.y,
                width: t.region.width,
                height: t.region.height,
            },
            led_position: t.position,
        }
    }
}

/// GET /api/led/{id} - where to point the indicator for an item
async fn led_target(
    State(state): State<Arc<AppState>>,
    ValidId(item_id): ValidId,
) -> Result<Json<LedResponse>, ApiError> {
    let target = LedLookup::new(&state.pool).resolve(item_id).await?;
    Ok(Json(LedResponse::from(target)))
}

/// LED routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/led/{id}", get(led_target))
}
