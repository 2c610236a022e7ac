//! Blob storage for the Clipsmith media pipeline.
//!
//! This crate provides:
//! - The `BlobStore` boundary consumed by upload intake and both workers
//! - A local filesystem backend (development, single-node deployments)
//! - An S3-compatible backend (production object storage)
//! - An env-driven factory selecting between them

pub mod error;
pub mod fs;
pub mod s3;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use fs::FsStore;
pub use s3::{S3Config, S3Store};

/// Storage boundary for raw uploads, processed outputs and thumbnails.
///
/// Names are storage-relative keys (may contain `/`, e.g.
/// `thumbnails/clip_thumbnail.jpg`). Every write returns the public URL the
/// object is served under.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist bytes under `name`. Returns the public URL.
    async fn save(&self, name: &str, bytes: &[u8]) -> StorageResult<String>;

    /// Persist a local file under `name`. Returns the public URL.
    async fn save_file(&self, name: &str, path: &Path) -> StorageResult<String>;

    /// Fetch the object into a local file, creating parent directories.
    async fn download(&self, name: &str, dest: &Path) -> StorageResult<()>;

    /// Check whether the object exists.
    async fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Delete the object. Returns `false` if it was already gone.
    async fn delete(&self, name: &str) -> StorageResult<bool>;

    /// Public URL for a key.
    fn url_for(&self, name: &str) -> String;

    /// Inverse of `url_for`: recover the storage key from a public URL
    /// this store produced. Returns `None` for foreign URLs.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Build a blob store from environment variables.
///
/// `STORAGE_BACKEND=s3` selects the S3 backend (credentials from the `S3_*`
/// variables); anything else falls back to the local filesystem store rooted
/// at `UPLOAD_DIR` (default `uploads`).
pub async fn storage_from_env() -> StorageResult<Arc<dyn BlobStore>> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_default();
    if backend.eq_ignore_ascii_case("s3") {
        let store = S3Store::from_env().await?;
        Ok(Arc::new(store))
    } else {
        let root = std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let base_url = std::env::var("UPLOAD_BASE_URL").unwrap_or_else(|_| "/uploads".to_string());
        Ok(Arc::new(FsStore::new(root, base_url)))
    }
}
