//! S3-compatible blob store.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::BlobStore;

/// Configuration for the S3 backend.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL (supports R2/MinIO-style endpoints)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2)
    pub region: String,
    /// Public base URL objects are served under (CDN or bucket website)
    pub public_base_url: String,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("S3_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("S3_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("S3_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("S3_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("S3_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("S3_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("S3_BUCKET_NAME not set"))?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("S3_PUBLIC_BASE_URL")
                .map_err(|_| StorageError::config_error("S3_PUBLIC_BASE_URL not set"))?,
        })
    }
}

/// S3-compatible storage client.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Store {
    /// Create a new store from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "clipsmith",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(S3Config::from_env()?).await
    }

    fn guess_content_type(name: &str) -> &'static str {
        match name.rsplit('.').next() {
            Some("mp4") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("wav") => "audio/wav",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn save(&self, name: &str, bytes: &[u8]) -> StorageResult<String> {
        debug!("Uploading {} bytes to {}", bytes.len(), name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(Self::guess_content_type(name))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(self.url_for(name))
    }

    async fn save_file(&self, name: &str, path: &Path) -> StorageResult<String> {
        debug!("Uploading {} to {}", path.display(), name);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(body)
            .content_type(Self::guess_content_type(name))
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), name);
        Ok(self.url_for(name))
    }

    async fn download(&self, name: &str, dest: &Path) -> StorageResult<()> {
        debug!("Downloading {} to {}", name, dest.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(name)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?
            .into_bytes();

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        Ok(())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("NotFound") || msg.contains("404") {
                    Ok(false)
                } else {
                    Err(StorageError::download_failed(msg))
                }
            }
        }
    }

    async fn delete(&self, name: &str) -> StorageResult<bool> {
        let existed = self.exists(name).await?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;
        Ok(existed)
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.public_base_url, name)
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.public_base_url);
        url.strip_prefix(&prefix).map(|s| s.to_string())
    }
}
