//! Application state.

use std::sync::Arc;

use clipsmith_queue::JobQueue;
use clipsmith_storage::{storage_from_env, BlobStore};
use clipsmith_store::{CaptionStore, RedisStore, VideoStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<dyn BlobStore>,
    pub videos: Arc<dyn VideoStore>,
    pub captions: Arc<dyn CaptionStore>,
    pub queue: Arc<JobQueue>,
}

impl AppState {
    /// Create new application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = storage_from_env().await?;
        let store = Arc::new(RedisStore::from_env()?);
        let queue = JobQueue::from_env()?;
        queue.init().await?;

        Ok(Self {
            config,
            storage,
            videos: store.clone(),
            captions: store,
            queue: Arc::new(queue),
        })
    }
}
