//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::BlobStore;

/// Filesystem-backed store rooted at an uploads directory.
///
/// Keys map directly to paths under the root; public URLs are
/// `{base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    base_url: String,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, name: &str) -> StorageResult<PathBuf> {
        validate_key(name)?;
        Ok(self.root.join(name))
    }
}

/// Reject keys that could escape the storage root.
fn validate_key(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.starts_with('/') {
        return Err(StorageError::invalid_key(name));
    }
    if name.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(StorageError::invalid_key(name));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsStore {
    async fn save(&self, name: &str, bytes: &[u8]) -> StorageResult<String> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(self.url_for(name))
    }

    async fn save_file(&self, name: &str, src: &Path) -> StorageResult<String> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(src, &path)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", src.display(), e)))?;
        info!("Stored {} as {}", src.display(), name);
        Ok(self.url_for(name))
    }

    async fn download(&self, name: &str, dest: &Path) -> StorageResult<()> {
        let path = self.resolve(name)?;
        if !fs::try_exists(&path).await? {
            return Err(StorageError::not_found(name));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&path, dest)
            .await
            .map_err(|e| StorageError::download_failed(format!("{}: {}", name, e)))?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        let path = self.resolve(name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, name: &str) -> StorageResult<bool> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::delete_failed(format!("{}: {}", name, e))),
        }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, name)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.base_url);
        url.strip_prefix(&prefix).map(|s| s.to_string())
    }
}
