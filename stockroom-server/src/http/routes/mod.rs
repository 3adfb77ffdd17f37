//! Route handlers organized by resource

pub mod health;
pub mod locations;
pub mod regions;
pub mod inventory;
pub mod search;
pub mod led;
pub mod uploads;

use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::ImageUpload;
use crate::storage::ImageStore;

/// Body returned by delete endpoints
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Public URL for a stored image reference.
pub(crate) fn image_url(reference: Option<String>) -> Option<String> {
    reference.map(|r| format!("{}/{}", uploads::MOUNT_PATH, r))
}

/// Save an image sent along with a create or update body.
pub(crate) async fn save_upload(
    images: &dyn ImageStore,
    upload: Option<ImageUpload>,
) -> Result<Option<String>, ApiError> {
    match upload {
        Some(upload) => Ok(Some(images.save(&upload.file_name, &upload.bytes).await?)),
        None => Ok(None),
    }
}

/// Remove an image that is no longer referenced.
///
/// Failures are logged, not returned: the row change already committed.
pub(crate) async fn discard_image(images: &dyn ImageStore, reference: Option<&str>) {
    let Some(reference) = reference else {
        return;
    };
    if let Err(e) = images.delete(reference).await {
        tracing::warn!(reference = %reference, error = %e, "failed to delete image");
    }
}
