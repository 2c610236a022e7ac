//! In-memory store for tests and local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use clipsmith_models::{CaptionSegment, VideoId, VideoRecord, VideoStatus};

use crate::error::{StoreError, StoreResult};
use crate::{CaptionStore, VideoStore};

/// Mutex-guarded in-memory implementation of both stores.
///
/// The video map lock gives the same read-check-write atomicity the Redis
/// Lua script provides, so guarded-transition semantics match production.
#[derive(Debug, Default)]
pub struct MemoryStore {
    videos: Mutex<HashMap<String, VideoRecord>>,
    captions: Mutex<HashMap<String, Vec<CaptionSegment>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn get(&self, id: &VideoId) -> StoreResult<Option<VideoRecord>> {
        let videos = self.videos.lock().unwrap();
        Ok(videos.get(id.as_str()).cloned())
    }

    async fn insert(&self, record: &VideoRecord) -> StoreResult<()> {
        let mut videos = self.videos.lock().unwrap();
        if videos.contains_key(record.id.as_str()) {
            return Err(StoreError::already_exists(record.id.to_string()));
        }
        videos.insert(record.id.to_string(), record.clone());
        Ok(())
    }

    async fn compare_and_update(
        &self,
        record: &VideoRecord,
        expected: VideoStatus,
    ) -> StoreResult<()> {
        let mut videos = self.videos.lock().unwrap();
        let current = videos
            .get(record.id.as_str())
            .ok_or_else(|| StoreError::not_found(record.id.to_string()))?;

        if current.status != expected {
            return Err(StoreError::precondition_failed(format!(
                "video {} is {}, expected {}",
                record.id, current.status, expected
            )));
        }
        videos.insert(record.id.to_string(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl CaptionStore for MemoryStore {
    async fn replace_by_video(
        &self,
        video_id: &VideoId,
        segments: &[CaptionSegment],
    ) -> StoreResult<()> {
        let mut captions = self.captions.lock().unwrap();
        if segments.is_empty() {
            captions.remove(video_id.as_str());
        } else {
            captions.insert(video_id.to_string(), segments.to_vec());
        }
        Ok(())
    }

    async fn get_by_video(&self, video_id: &VideoId) -> StoreResult<Vec<CaptionSegment>> {
        let captions = self.captions.lock().unwrap();
        let mut segments = captions.get(video_id.as_str()).cloned().unwrap_or_default();
        segments.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Ok(segments)
    }

    async fn delete_by_video(&self, video_id: &VideoId) -> StoreResult<bool> {
        let mut captions = self.captions.lock().unwrap();
        Ok(captions.remove(video_id.as_str()).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> VideoRecord {
        VideoRecord::new(VideoId::new(), "Clip", "", "creator-1")
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let video = record();
        store.insert(&video).await.unwrap();

        let loaded = store.get(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, VideoStatus::Uploading);

        assert!(matches!(
            store.insert(&video).await.unwrap_err(),
            StoreError::AlreadyExists(_)
        ));
    }

    #[tokio::test]
    async fn test_compare_and_update_guards_status() {
        let store = MemoryStore::new();
        let video = record();
        store.insert(&video).await.unwrap();

        let processing = video.clone().mark_processing().unwrap();
        store
            .compare_and_update(&processing, VideoStatus::Uploading)
            .await
            .unwrap();

        // A stale writer that still believes the record is Uploading loses
        let stale = video.mark_processing().unwrap();
        let err = store
            .compare_and_update(&stale, VideoStatus::Uploading)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn test_compare_and_update_missing_record() {
        let store = MemoryStore::new();
        let video = record().mark_processing().unwrap();
        let err = store
            .compare_and_update(&video, VideoStatus::Uploading)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_captions_ordered_and_bulk_deleted() {
        let store = MemoryStore::new();
        let video_id = VideoId::new();

        let segments = vec![
            CaptionSegment::new(video_id.clone(), "second", 5.0, 7.0, "en"),
            CaptionSegment::new(video_id.clone(), "first", 0.0, 2.0, "en"),
        ];
        store.replace_by_video(&video_id, &segments).await.unwrap();

        let loaded = store.get_by_video(&video_id).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "first");
        assert_eq!(loaded[1].text, "second");

        assert!(store.delete_by_video(&video_id).await.unwrap());
        assert!(!store.delete_by_video(&video_id).await.unwrap());
        assert!(store.get_by_video(&video_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let store = MemoryStore::new();
        let video_id = VideoId::new();

        let first = vec![
            CaptionSegment::new(video_id.clone(), "old one", 0.0, 2.0, "en"),
            CaptionSegment::new(video_id.clone(), "old two", 2.0, 4.0, "en"),
            CaptionSegment::new(video_id.clone(), "old three", 4.0, 6.0, "en"),
        ];
        store.replace_by_video(&video_id, &first).await.unwrap();

        // A second run swaps the whole set; nothing from the first survives
        let second = vec![CaptionSegment::new(video_id.clone(), "new", 0.0, 3.0, "en")];
        store.replace_by_video(&video_id, &second).await.unwrap();

        let loaded = store.get_by_video(&video_id).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "new");

        // An empty batch clears the set
        store.replace_by_video(&video_id, &[]).await.unwrap();
        assert!(store.get_by_video(&video_id).await.unwrap().is_empty());
    }
}
