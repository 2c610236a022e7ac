//! Caption job handler.
//!
//! Pulls the published playable file for a READY video, extracts an audio
//! track, transcribes it, and persists caption segments. The video status is
//! never touched here: a caption failure leaves the video playable and the
//! job goes back to the queue (and eventually the dead-letter stream).

use tracing::info;

use clipsmith_models::{CaptionSegment, VideoId, VideoStatus};
use clipsmith_queue::CaptionJob;

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::stt::TranscriptWord;
use crate::transcode::scratch_dir;

/// Words per caption line before the segmenter forces a break.
const MAX_WORDS_PER_SEGMENT: usize = 5;

/// Process a caption job.
///
/// `Ok(())` means acknowledge: success or a redelivery no-op. Everything
/// else, including transcription faults, is returned for queue retry.
pub async fn handle_caption(ctx: &ProcessingContext, job: &CaptionJob) -> WorkerResult<()> {
    match run_caption(ctx, job).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_drop() => {
            info!("Dropping caption job for video {}: {}", job.video_id, e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn run_caption(ctx: &ProcessingContext, job: &CaptionJob) -> WorkerResult<()> {
    let record = ctx
        .videos
        .get(&job.video_id)
        .await?
        .ok_or_else(|| WorkerError::not_found(format!("video {}", job.video_id)))?;

    if record.status != VideoStatus::Ready {
        return Err(WorkerError::precondition_failed(format!(
            "video {} is {}, captions need READY",
            job.video_id, record.status
        )));
    }

    // Ready records always carry a URL; a bare one means there is nothing
    // to caption, so drop rather than retry
    let url = record.url.as_deref().ok_or_else(|| {
        WorkerError::precondition_failed(format!("video {} has no published URL", job.video_id))
    })?;
    let key = ctx.storage.key_for_url(url).ok_or_else(|| {
        WorkerError::resource_missing(format!("URL {url} does not map to a storage key"))
    })?;

    let scratch = scratch_dir(&ctx.config.work_dir, "caption")?;

    let video_local = scratch.path().join("video.mp4");
    ctx.storage.download(&key, &video_local).await?;

    let audio_local = scratch.path().join("audio.wav");
    ctx.engine.extract_audio(&video_local, &audio_local).await?;

    let language = &ctx.config.caption_language;
    let words = ctx.transcriber.transcribe(&audio_local, language).await?;
    info!(
        "Transcribed video {}: {} words",
        job.video_id,
        words.len()
    );

    let segments = segment_words(&words, &job.video_id, language);

    // Regeneration swaps the whole set in one store operation, so a
    // redelivered job converges instead of duplicating segments and a
    // concurrent reader never sees a partial batch
    ctx.captions
        .replace_by_video(&job.video_id, &segments)
        .await?;

    info!(
        "Saved {} caption segments for video {}",
        segments.len(),
        job.video_id
    );
    Ok(())
}

/// Group word-level timestamps into caption lines.
///
/// A line closes after `MAX_WORDS_PER_SEGMENT` words or when a word ends a
/// sentence; a trailing partial line is flushed. Timestamps convert from
/// milliseconds to seconds spanning first word start to last word end.
pub fn segment_words(
    words: &[TranscriptWord],
    video_id: &VideoId,
    language: &str,
) -> Vec<CaptionSegment> {
    let mut segments = Vec::new();
    let mut current: Vec<&TranscriptWord> = Vec::new();

    for word in words {
        current.push(word);

        let ends_sentence = word
            .text
            .chars()
            .last()
            .is_some_and(|c| matches!(c, '.' | '?' | '!'));

        if current.len() >= MAX_WORDS_PER_SEGMENT || ends_sentence {
            segments.push(close_segment(&current, video_id, language));
            current.clear();
        }
    }

    if !current.is_empty() {
        segments.push(close_segment(&current, video_id, language));
    }

    segments
}

fn close_segment(words: &[&TranscriptWord], video_id: &VideoId, language: &str) -> CaptionSegment {
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let start_ms = words.first().map(|w| w.start_ms).unwrap_or(0);
    let end_ms = words.last().map(|w| w.end_ms).unwrap_or(start_ms);

    CaptionSegment::new(
        video_id.clone(),
        text,
        start_ms as f64 / 1000.0,
        end_ms as f64 / 1000.0,
        language,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use clipsmith_models::{VideoId, VideoRecord};
    use clipsmith_queue::CaptionJob;

    use crate::testutil::{words, TestContext};

    fn vid() -> VideoId {
        VideoId::new()
    }

    #[test]
    fn test_segmentation_breaks_on_count_and_punctuation() {
        let ws = words(&["Hello", "world,", "this", "is", "a", "test."]);
        let segments = segment_words(&ws, &vid(), "en");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello world, this is a");
        assert_eq!(segments[1].text, "test.");
    }

    #[test]
    fn test_segmentation_flushes_trailing_partial() {
        let ws = words(&["Short", "tail"]);
        let segments = segment_words(&ws, &vid(), "en");

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Short tail");
    }

    #[test]
    fn test_segmentation_timestamps_are_seconds() {
        let ws = words(&["One?", "Two"]);
        let segments = segment_words(&ws, &vid(), "en");

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start_time, 0.0);
        assert_eq!(segments[0].end_time, 0.4);
        assert_eq!(segments[1].start_time, 0.5);
        assert_eq!(segments[1].end_time, 0.9);
    }

    #[test]
    fn test_segmentation_empty_transcript() {
        assert!(segment_words(&[], &vid(), "en").is_empty());
    }

    async fn ready_video(t: &TestContext) -> VideoRecord {
        let record = VideoRecord::new(VideoId::new(), "Clip", "desc", "creator-1");
        t.ctx.videos.insert(&record).await.unwrap();

        let url = t.ctx.storage.save("clip_processed.mp4", b"mp4").await.unwrap();
        let thumb = t
            .ctx
            .storage
            .save("thumbnails/clip_thumbnail.jpg", b"jpg")
            .await
            .unwrap();
        let ready = record
            .mark_processing()
            .unwrap()
            .mark_ready(url, thumb, 12.0)
            .unwrap();
        t.ctx
            .videos
            .compare_and_update(&ready, VideoStatus::Uploading)
            .await
            .unwrap();
        ready
    }

    #[tokio::test]
    async fn test_caption_happy_path() {
        let t = TestContext::with_transcript(words(&["Hello", "world."]));
        let record = ready_video(&t).await;

        handle_caption(&t.ctx, &CaptionJob::new(record.id.clone()))
            .await
            .unwrap();

        let segments = t.ctx.captions.get_by_video(&record.id).await.unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Hello world.");
        assert_eq!(segments[0].language, "en");
        assert_eq!(t.engine.audio_calls(), 1);

        // Video status untouched
        let after = t.ctx.videos.get(&record.id).await.unwrap().unwrap();
        assert_eq!(after.status, VideoStatus::Ready);
    }

    #[tokio::test]
    async fn test_caption_requires_ready() {
        let t = TestContext::with_transcript(words(&["Hi"]));
        let record = VideoRecord::new(VideoId::new(), "Clip", "desc", "creator-1");
        t.ctx.videos.insert(&record).await.unwrap();

        // Still UPLOADING: acknowledged drop, transcriber never called
        handle_caption(&t.ctx, &CaptionJob::new(record.id.clone()))
            .await
            .unwrap();
        assert_eq!(t.transcriber.calls(), 0);
        assert!(t.ctx.captions.get_by_video(&record.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caption_redelivery_replaces_segments() {
        let t = TestContext::with_transcript(words(&["Again."]));
        let record = ready_video(&t).await;
        let job = CaptionJob::new(record.id.clone());

        handle_caption(&t.ctx, &job).await.unwrap();
        handle_caption(&t.ctx, &job).await.unwrap();

        let segments = t.ctx.captions.get_by_video(&record.id).await.unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_video_is_acked_drop() {
        let t = TestContext::new();
        handle_caption(&t.ctx, &CaptionJob::new(VideoId::new()))
            .await
            .unwrap();
    }
}
