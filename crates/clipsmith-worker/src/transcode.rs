//! Transcode job handler.
//!
//! Takes the raw upload, produces a normalized playable file plus a
//! thumbnail, publishes both to storage, and flips the record to READY in a
//! single guarded write. Any fault of the work itself flips the record to
//! FAILED instead; only infrastructure errors bubble out for redelivery.

use std::path::Path;

use tracing::{info, warn};

use clipsmith_models::{VideoId, VideoStatus};
use clipsmith_queue::TranscodeJob;
use clipsmith_store::StoreError;

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};

/// Process a transcode job end to end.
///
/// Returns `Ok(())` for every outcome the queue should acknowledge: success,
/// redelivery no-ops, and job faults that were persisted as FAILED. Errors
/// that escape are infrastructure failures the queue retries.
pub async fn handle_transcode(ctx: &ProcessingContext, job: &TranscodeJob) -> WorkerResult<()> {
    match run_transcode(ctx, job).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_drop() => {
            info!("Dropping transcode job for video {}: {}", job.video_id, e);
            Ok(())
        }
        Err(e) if e.is_job_fault() => {
            warn!("Transcode failed for video {}: {}", job.video_id, e);
            fail_video(ctx, &job.video_id, &e.to_string()).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run_transcode(ctx: &ProcessingContext, job: &TranscodeJob) -> WorkerResult<()> {
    let record = ctx
        .videos
        .get(&job.video_id)
        .await?
        .ok_or_else(|| WorkerError::not_found(format!("video {}", job.video_id)))?;

    if !record.status.is_transcode_eligible() {
        return Err(WorkerError::precondition_failed(format!(
            "video {} is {}, not transcode-eligible",
            job.video_id, record.status
        )));
    }

    // Claim the record before doing any heavy work; a concurrent delivery
    // for the same video loses this compare-and-swap and drops out.
    let previous_status = record.status;
    let processing = record
        .mark_processing()
        .map_err(|e| WorkerError::precondition_failed(e.to_string()))?;
    match ctx.videos.compare_and_update(&processing, previous_status).await {
        Ok(()) => {}
        Err(StoreError::PreconditionFailed(msg)) => {
            return Err(WorkerError::precondition_failed(msg));
        }
        Err(e) => return Err(e.into()),
    }

    if !ctx.storage.exists(&job.raw_file_path).await? {
        return Err(WorkerError::resource_missing(format!(
            "raw upload {} not in storage",
            job.raw_file_path
        )));
    }

    let scratch = scratch_dir(&ctx.config.work_dir, "transcode")?;

    let raw_name = file_name(&job.raw_file_path)?;
    let raw_local = scratch.path().join(raw_name);
    ctx.storage.download(&job.raw_file_path, &raw_local).await?;

    let probe = ctx.engine.probe(&raw_local).await?;
    info!(
        "Probed video {}: {:.2}s, {}x{}",
        job.video_id, probe.duration, probe.width, probe.height
    );

    let stem = file_stem(&job.raw_file_path)?;
    let processed_key = format!("{stem}_processed.mp4");
    let thumbnail_key = format!("thumbnails/{stem}_thumbnail.jpg");

    let processed_local = scratch.path().join(format!("{stem}_processed.mp4"));
    ctx.engine.transcode(&raw_local, &processed_local).await?;

    // Past the end of very short clips, fall back to the first frame
    let offset = if probe.duration > ctx.config.thumbnail_offset_seconds {
        ctx.config.thumbnail_offset_seconds
    } else {
        0.0
    };
    let thumbnail_local = scratch.path().join(format!("{stem}_thumbnail.jpg"));
    ctx.engine
        .extract_frame(&raw_local, &thumbnail_local, offset)
        .await?;

    let url = ctx.storage.save_file(&processed_key, &processed_local).await?;
    let thumbnail_url = match ctx.storage.save_file(&thumbnail_key, &thumbnail_local).await {
        Ok(u) => u,
        Err(e) => {
            // Never leave a playable file nothing references
            if let Err(del) = ctx.storage.delete(&processed_key).await {
                warn!("Failed to clean up orphaned output {}: {}", processed_key, del);
            }
            return Err(e.into());
        }
    };

    let ready = processing
        .mark_ready(&url, &thumbnail_url, probe.duration)
        .map_err(|e| WorkerError::precondition_failed(e.to_string()))?;
    // Losing this race (another actor moved the record off PROCESSING while
    // we worked) is a drop, not a retryable infrastructure failure
    match ctx
        .videos
        .compare_and_update(&ready, VideoStatus::Processing)
        .await
    {
        Ok(()) => {}
        Err(StoreError::PreconditionFailed(msg)) => {
            return Err(WorkerError::precondition_failed(msg));
        }
        Err(e) => return Err(e.into()),
    }

    info!("Video {} is ready at {}", job.video_id, url);

    // The raw upload is no longer needed once outputs are published
    if let Err(e) = ctx.storage.delete(&job.raw_file_path).await {
        warn!("Failed to delete raw upload {}: {}", job.raw_file_path, e);
    }

    Ok(())
}

/// Persist FAILED guarded by whatever status the record currently holds.
/// Losing the race here means someone else already moved the record on.
async fn fail_video(ctx: &ProcessingContext, video_id: &VideoId, reason: &str) -> WorkerResult<()> {
    let Some(record) = ctx.videos.get(video_id).await? else {
        return Ok(());
    };
    let current = record.status;
    let failed = match record.mark_failed(reason) {
        Ok(r) => r,
        Err(_) => return Ok(()),
    };
    match ctx.videos.compare_and_update(&failed, current).await {
        Ok(()) | Err(StoreError::PreconditionFailed(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn scratch_dir(work_dir: &str, label: &str) -> std::io::Result<tempfile::TempDir> {
    std::fs::create_dir_all(work_dir)?;
    tempfile::Builder::new()
        .prefix(&format!("{label}-"))
        .tempdir_in(work_dir)
}

fn file_name(key: &str) -> WorkerResult<&str> {
    key.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WorkerError::resource_missing(format!("storage key {key:?} has no file name")))
}

fn file_stem(key: &str) -> WorkerResult<&str> {
    let name = file_name(key)?;
    Ok(Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    use clipsmith_models::{VideoId, VideoRecord};
    use clipsmith_queue::TranscodeJob;
    use clipsmith_store::MemoryStore;

    use crate::testutil::TestContext;

    async fn seeded(t: &TestContext) -> (VideoRecord, TranscodeJob) {
        let record = VideoRecord::new(VideoId::new(), "Test clip", "desc", "creator-1");
        t.ctx.videos.insert(&record).await.unwrap();

        let raw_key = "abc123_clip.mov";
        t.ctx.storage.save(raw_key, b"raw bytes").await.unwrap();

        let job = TranscodeJob::new(record.id.clone(), raw_key);
        (record, job)
    }

    #[tokio::test]
    async fn test_transcode_happy_path() {
        let t = TestContext::new();
        let (record, job) = seeded(&t).await;

        handle_transcode(&t.ctx, &job).await.unwrap();

        let updated = t.ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(updated.status, VideoStatus::Ready);
        assert!(updated
            .url
            .as_deref()
            .unwrap()
            .ends_with("abc123_clip_processed.mp4"));
        assert!(updated
            .thumbnail_url
            .as_deref()
            .unwrap()
            .contains("thumbnails/abc123_clip_thumbnail.jpg"));
        assert!(updated.duration_seconds > 0.0);

        // Raw upload cleaned up, outputs published
        assert!(!t.ctx.storage.exists("abc123_clip.mov").await.unwrap());
        assert!(t.ctx.storage.exists("abc123_clip_processed.mp4").await.unwrap());
        assert!(t
            .ctx
            .storage
            .exists("thumbnails/abc123_clip_thumbnail.jpg")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_record_is_acked_drop() {
        let t = TestContext::new();
        let job = TranscodeJob::new(VideoId::new(), "nope.mov");

        // No record in the store: the job is a no-op, not an error
        handle_transcode(&t.ctx, &job).await.unwrap();
        assert_eq!(t.engine.transcode_calls(), 0);
    }

    #[tokio::test]
    async fn test_redelivery_after_ready_is_noop() {
        let t = TestContext::new();
        let (record, job) = seeded(&t).await;

        handle_transcode(&t.ctx, &job).await.unwrap();
        let ready = t.ctx.videos.get(&record.id).await.unwrap().unwrap();

        // Same delivery again: status guard drops it without touching state
        handle_transcode(&t.ctx, &job).await.unwrap();
        let after = t.ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(after.status, VideoStatus::Ready);
        assert_eq!(after.url, ready.url);
        assert_eq!(t.engine.transcode_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_raw_file_marks_failed() {
        let t = TestContext::new();
        let (record, _) = seeded(&t).await;
        let job = TranscodeJob::new(record.id.clone(), "vanished.mov");

        handle_transcode(&t.ctx, &job).await.unwrap();

        let updated = t.ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(updated.status, VideoStatus::Failed);
        assert!(updated
            .error_message
            .as_deref()
            .unwrap()
            .contains("vanished.mov"));
        assert!(updated.url.is_none());
    }

    #[tokio::test]
    async fn test_engine_failure_marks_failed() {
        let t = TestContext::failing_engine();
        let (record, job) = seeded(&t).await;

        handle_transcode(&t.ctx, &job).await.unwrap();

        let updated = t.ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(updated.status, VideoStatus::Failed);
        assert!(updated.error_message.is_some());
        assert!(updated.url.is_none());
        assert!(updated.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_short_clip_uses_first_frame() {
        let t = TestContext::with_duration(0.5);
        let (_, job) = seeded(&t).await;

        handle_transcode(&t.ctx, &job).await.unwrap();
        assert_eq!(t.engine.last_frame_offset(), Some(0.0));
    }

    /// Video store that lets the PROCESSING claim through but rejects the
    /// final READY publish, as if another actor moved the record meanwhile.
    struct LostPublishStore {
        inner: MemoryStore,
    }

    #[async_trait::async_trait]
    impl clipsmith_store::VideoStore for LostPublishStore {
        async fn get(
            &self,
            id: &VideoId,
        ) -> clipsmith_store::StoreResult<Option<VideoRecord>> {
            self.inner.get(id).await
        }

        async fn insert(&self, record: &VideoRecord) -> clipsmith_store::StoreResult<()> {
            self.inner.insert(record).await
        }

        async fn compare_and_update(
            &self,
            record: &VideoRecord,
            expected: VideoStatus,
        ) -> clipsmith_store::StoreResult<()> {
            if record.status == VideoStatus::Ready {
                return Err(StoreError::precondition_failed(
                    "video moved off PROCESSING",
                ));
            }
            self.inner.compare_and_update(record, expected).await
        }
    }

    #[tokio::test]
    async fn test_lost_ready_publish_is_acked_drop() {
        use std::sync::Arc;

        use clipsmith_storage::FsStore;

        use crate::config::WorkerConfig;
        use crate::testutil::{StubEngine, StubTranscriber};

        let storage_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let videos = Arc::new(LostPublishStore {
            inner: MemoryStore::new(),
        });
        let ctx = crate::context::ProcessingContext::new(
            WorkerConfig {
                work_dir: work_dir.path().to_string_lossy().into_owned(),
                ..WorkerConfig::default()
            },
            videos.clone(),
            Arc::new(MemoryStore::new()),
            Arc::new(FsStore::new(storage_dir.path(), "/uploads")),
            StubEngine::new(30.0, false),
            StubTranscriber::with_words(Vec::new()),
        );

        let record = VideoRecord::new(VideoId::new(), "Test clip", "desc", "creator-1");
        ctx.videos.insert(&record).await.unwrap();
        ctx.storage.save("race_clip.mov", b"raw bytes").await.unwrap();

        // Losing the final compare-and-swap must acknowledge, not retry
        let job = TranscodeJob::new(record.id.clone(), "race_clip.mov");
        handle_transcode(&ctx, &job).await.unwrap();

        // Our READY never landed and the record was not marked FAILED
        let after = ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(after.status, VideoStatus::Processing);
    }

    #[test]
    fn test_key_helpers() {
        assert_eq!(file_name("thumbnails/a_b.jpg").unwrap(), "a_b.jpg");
        assert_eq!(file_stem("abc_clip.mov").unwrap(), "abc_clip");
        assert!(file_name("trailing/").is_err());
    }
}
