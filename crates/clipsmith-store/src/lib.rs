//! Video record and caption stores.
//!
//! The video record is the single source of truth for processing status;
//! every status transition goes through `compare_and_update` so a concurrent
//! or redelivered job can never clobber newer state.
//!
//! This crate provides:
//! - The `VideoStore` / `CaptionStore` boundary traits
//! - A Redis-backed implementation (JSON documents, Lua compare-and-swap)
//! - An in-memory implementation for tests

pub mod error;
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;

use clipsmith_models::{CaptionSegment, VideoId, VideoRecord, VideoStatus};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Persistent store for video records.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Load a record by ID.
    async fn get(&self, id: &VideoId) -> StoreResult<Option<VideoRecord>>;

    /// Insert a freshly created record.
    async fn insert(&self, record: &VideoRecord) -> StoreResult<()>;

    /// Atomically replace the record, but only if its currently persisted
    /// status equals `expected`. Fails with `PreconditionFailed` otherwise.
    ///
    /// This is the status-guarded transition the at-least-once queue relies
    /// on: a redelivered job re-reads status and loses the race cleanly.
    async fn compare_and_update(
        &self,
        record: &VideoRecord,
        expected: VideoStatus,
    ) -> StoreResult<()>;
}

/// Persistent store for caption segments.
#[async_trait]
pub trait CaptionStore: Send + Sync {
    /// Atomically replace every segment for `video_id` with `segments`.
    /// Readers observe either the previous set or the complete new one,
    /// never a partial batch.
    async fn replace_by_video(
        &self,
        video_id: &VideoId,
        segments: &[CaptionSegment],
    ) -> StoreResult<()>;

    /// Segments for a video, ordered by `start_time` ascending.
    async fn get_by_video(&self, video_id: &VideoId) -> StoreResult<Vec<CaptionSegment>>;

    /// Bulk-delete all segments for a video.
    /// Returns `false` if there were none.
    async fn delete_by_video(&self, video_id: &VideoId) -> StoreResult<bool>;
}
