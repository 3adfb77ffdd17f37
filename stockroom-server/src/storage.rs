//! Image storage trait and implementations
//!
//! Provides a trait for persisting uploaded images, with:
//! - Filesystem implementation rooted at the uploads directory
//! - In-memory implementation for testing
//!
//! References handed back by `save` are bare file names. They are
//! stored on rows as-is and served under `/uploads/<reference>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

/// Characters outside this set are replaced in stored file names.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("invalid file name regex")
});

/// Used when sanitizing leaves nothing usable.
const FALLBACK_STEM: &str = "image";

/// Error from an image store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid image reference: {0}")]
    InvalidReference(String),
}

/// Trait for image persistence (testable)
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store bytes under a unique name derived from `suggested_name`.
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored image. Deleting a missing image succeeds.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// Build a unique, path-safe file name from a client-supplied one.
///
/// `"My Photo.JPG"` becomes `"My_Photo_<32 hex>.JPG"`.
pub fn unique_file_name(suggested_name: &str) -> String {
    // Only the last path component of the client name matters
    let base = suggested_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_start_matches(['.', '_']);

    let (stem, ext) = match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (cleaned, None),
    };
    let stem = if stem.is_empty() { FALLBACK_STEM } else { stem };
    let suffix = Uuid::new_v4().simple();

    match ext {
        Some(ext) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}_{suffix}"),
    }
}

/// Reject references that could escape the uploads directory.
pub fn validate_reference(reference: &str) -> Result<(), StorageError> {
    // Without separators only "." and ".." can point outside the directory
    if matches!(reference, "" | "." | "..") || reference.contains(['/', '\\']) {
        return Err(StorageError::InvalidReference(reference.to_string()));
    }
    Ok(())
}

/// Filesystem image store
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let reference = unique_file_name(suggested_name);
        tokio::fs::write(self.root.join(&reference), bytes).await?;

        tracing::debug!(reference = %reference, size = bytes.len(), "image saved");
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        validate_reference(reference)?;

        match tokio::fs::remove_file(self.root.join(reference)).await {
            Ok(()) => {
                tracing::debug!(reference = %reference, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory image store for testing
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let reference = unique_file_name(suggested_name);
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        validate_reference(reference)?;
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reference);
        Ok(())
    }
}
