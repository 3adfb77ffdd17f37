//! Location endpoints
//!
//! Locations nest through `parentId`. Deleting one leaves its children,
//! regions and items in place.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{discard_image, image_url, save_upload, SuccessResponse};
use crate::db::repos::{Location, LocationFilter, LocationPatch, LocationRepo, NewLocation};
use crate::http::error::ApiError;
use crate::http::extractors::{FormFields, ImageUpload, ValidId, WithImage};
use crate::http::server::AppState;
use crate::models::{EntityName, Patch};

/// Query for GET /api/locations
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLocationsQuery {
    pub parent_id: Option<i64>,
    pub root: Option<bool>,
}

impl From<ListLocationsQuery> for LocationFilter {
    /// `parentId` wins over `root`.
    fn from(q: ListLocationsQuery) -> Self {
        match (q.parent_id, q.root) {
            (Some(parent_id), _) => Self::ChildrenOf(parent_id),
            (None, Some(true)) => Self::Roots,
            _ => Self::All,
        }
    }
}

/// Create location request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
}

impl FormFields for CreateLocationRequest {
    const INTEGER_FIELDS: &'static [&'static str] = &["parentId"];
}

/// Update location request; absent fields are left alone
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateLocationRequest {
    pub name: Patch<String>,
    pub description: Patch<Option<String>>,
    pub parent_id: Patch<Option<i64>>,
}

impl FormFields for UpdateLocationRequest {
    const INTEGER_FIELDS: &'static [&'static str] = &["parentId"];
}

/// Location response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub image_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Location> for LocationResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
            description: l.description,
            parent_id: l.parent_id,
            image_path: image_url(l.image_path),
            created_at: l.created_at.to_rfc3339(),
            updated_at: l.updated_at.to_rfc3339(),
        }
    }
}

/// One step of a breadcrumb trail
#[derive(Debug, Serialize)]
pub struct BreadcrumbResponse {
    pub id: i64,
    pub name: String,
}

impl From<Location> for BreadcrumbResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
        }
    }
}

/// GET /api/locations - list, optionally by parent or roots only
async fn list_locations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLocationsQuery>,
) -> Result<Json<Vec<LocationResponse>>, ApiError> {
    let locations = LocationRepo::new(&state.pool).list(query.into()).await?;
    Ok(Json(locations.into_iter().map(LocationResponse::from).collect()))
}

/// POST /api/locations - create a location, JSON or multipart with `image`
async fn create_location(
    State(state): State<Arc<AppState>>,
    WithImage { body: req, image }: WithImage<CreateLocationRequest>,
) -> Result<(StatusCode, Json<LocationResponse>), ApiError> {
    let name = EntityName::new(&req.name)?;
    let image_path = save_upload(state.images.as_ref(), image).await?;

    let new = NewLocation {
        description: req.description,
        parent_id: req.parent_id,
        image_path: image_path.clone(),
        ..NewLocation::named(name)
    };
    let location = match LocationRepo::new(&state.pool).create(new).await {
        Ok(location) => location,
        Err(e) => {
            discard_image(state.images.as_ref(), image_path.as_deref()).await;
            return Err(e.into());
        }
    };

    Ok((StatusCode::CREATED, Json(LocationResponse::from(location))))
}

/// GET /api/locations/{id}
async fn get_location(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<LocationResponse>, ApiError> {
    let location = LocationRepo::new(&state.pool).get(id).await?;
    Ok(Json(LocationResponse::from(location)))
}

/// PUT /api/locations/{id} - partial update; a multipart `image` replaces the old one
async fn update_location(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    WithImage { body: req, image }: WithImage<UpdateLocationRequest>,
) -> Result<Json<LocationResponse>, ApiError> {
    let name = req.name.try_map(|n| EntityName::new(&n))?;
    let repo = LocationRepo::new(&state.pool);

    let previous = match image {
        Some(_) => repo.get(id).await?.image_path,
        None => None,
    };
    let stored = save_upload(state.images.as_ref(), image).await?;

    let patch = LocationPatch {
        name,
        description: req.description,
        parent_id: req.parent_id,
        image_path: match &stored {
            Some(reference) => Patch::Set(Some(reference.clone())),
            None => Patch::Unchanged,
        },
    };
    let location = match repo.update(id, patch).await {
        Ok(location) => location,
        Err(e) => {
            discard_image(state.images.as_ref(), stored.as_deref()).await;
            return Err(e.into());
        }
    };

    if stored.is_some() {
        discard_image(state.images.as_ref(), previous.as_deref()).await;
    }
    Ok(Json(LocationResponse::from(location)))
}

/// DELETE /api/locations/{id} - delete the row and its image
async fn delete_location(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<SuccessResponse>, ApiError> {
    let location = LocationRepo::new(&state.pool).delete(id).await?;
    discard_image(state.images.as_ref(), location.image_path.as_deref()).await;

    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/locations/{id}/breadcrumbs - root-first ancestor chain
async fn get_breadcrumbs(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<BreadcrumbResponse>>, ApiError> {
    let trail = LocationRepo::new(&state.pool).breadcrumbs(id).await?;
    if trail.is_empty() {
        return Err(ApiError::NotFound {
            resource: "location",
            id: id.to_string(),
        });
    }
    Ok(Json(trail.into_iter().map(BreadcrumbResponse::from).collect()))
}

/// POST /api/locations/{id}/image - replace the location image
async fn upload_location_image(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    upload: ImageUpload,
) -> Result<Json<LocationResponse>, ApiError> {
    let repo = LocationRepo::new(&state.pool);
    let previous = repo.get(id).await?.image_path;

    let reference = state.images.save(&upload.file_name, &upload.bytes).await?;
    let patch = LocationPatch {
        image_path: Patch::Set(Some(reference.clone())),
        ..Default::default()
    };
    let location = match repo.update(id, patch).await {
        Ok(location) => location,
        Err(e) => {
            discard_image(state.images.as_ref(), Some(&reference)).await;
            return Err(e.into());
        }
    };

    discard_image(state.images.as_ref(), previous.as_deref()).await;
    Ok(Json(LocationResponse::from(location)))
}

/// Location routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/locations", get(list_locations).post(create_location))
        .route(
            "/api/locations/{id}",
            get(get_location).put(update_location).delete(delete_location),
        )
        .route("/api/locations/{id}/breadcrumbs", get(get_breadcrumbs))
        .route("/api/locations/{id}/image", post(upload_location_image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_filter_wins_over_root() {
        let filter: LocationFilter = ListLocationsQuery {
            parent_id: Some(4),
            root: Some(true),
        }
        .into();
        assert_eq!(filter, LocationFilter::ChildrenOf(4));

        let filter: LocationFilter = ListLocationsQuery {
            parent_id: None,
            root: Some(true),
        }
        .into();
        assert_eq!(filter, LocationFilter::Roots);

        let filter: LocationFilter = ListLocationsQuery::default().into();
        assert_eq!(filter, LocationFilter::All);
    }

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let req: UpdateLocationRequest =
            serde_json::from_str(r#"{"parentId": null}"#).unwrap();
        assert_eq!(req.parent_id, Patch::Set(None));
        assert!(req.name.is_unchanged());
        assert!(req.description.is_unchanged());
    }
}
