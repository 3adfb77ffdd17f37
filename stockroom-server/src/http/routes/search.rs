//! Search endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::inventory::ItemResponse;
use crate::db::repos::InventoryRepo;
use crate::http::error::ApiError;
use crate::http::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/search?q= - ranked matches; a blank query returns `[]`
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = InventoryRepo::new(&state.pool).search(&params.q).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// Search routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/search", get(search))
}
