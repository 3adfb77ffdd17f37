//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::storage::StorageError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Item has no location/region to resolve (400)
    NoLocationContext { item_id: i64 },

    /// Write would make the hierarchy cyclic (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),

    /// Image store failure (500, logged)
    Storage(StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::NoLocationContext { item_id } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "no_location_context",
                    "message": format!(
                        "inventory item '{}' does not have a location with a region",
                        item_id
                    )
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Database(e @ DbError::CorruptHierarchy { .. }) => {
                tracing::error!("Hierarchy corruption: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "corrupt_hierarchy",
                        "message": e.to_string()
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Storage(e) => {
                tracing::error!("Image storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Invalid(e) => Self::Validation(e),
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::NoLocationContext { item_id } => Self::NoLocationContext { item_id },
            DbError::HierarchyCycle { .. } => Self::Conflict {
                message: e.to_string(),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let err = ApiError::from(DbError::NotFound {
            resource: "location",
            id: "7".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "location '7' not found");
    }

    #[tokio::test]
    async fn invalid_stored_combination_is_validation_400() {
        let invalid = ValidationError::OutOfRange {
            field: "width",
            value: "1e308".into(),
        };
        let response = ApiError::from(DbError::Invalid(invalid)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "validation_error");
    }

    #[tokio::test]
    async fn no_location_context_is_distinct_400() {
        let err = ApiError::from(DbError::NoLocationContext { item_id: 3 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "no_location_context");
    }

    #[tokio::test]
    async fn hierarchy_cycle_is_409() {
        let err = ApiError::from(DbError::HierarchyCycle {
            location_id: 1,
            parent_id: 2,
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn corrupt_hierarchy_is_reported() {
        let err = ApiError::from(DbError::CorruptHierarchy { location_id: 4 });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "corrupt_hierarchy");
    }

    #[tokio::test]
    async fn storage_error_hides_details() {
        let err = ApiError::from(StorageError::InvalidReference("../x".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["message"], "an internal error occurred");
    }
}
