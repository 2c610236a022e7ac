//! Job contracts for the media pipeline.
//!
//! Payloads carry only small, serializable arguments (IDs and storage keys);
//! everything else is re-derived from the video record at execution time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clipsmith_models::{JobId, VideoId};

/// Job to transcode a raw upload into a playable file plus thumbnail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Video record to process
    pub video_id: VideoId,
    /// Storage key of the raw uploaded file
    pub raw_file_path: String,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl TranscodeJob {
    pub fn new(video_id: VideoId, raw_file_path: impl Into<String>) -> Self {
        Self {
            job_id: JobId::new(),
            video_id,
            raw_file_path: raw_file_path.into(),
            created_at: Utc::now(),
        }
    }

    /// Idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("transcode:{}", self.video_id)
    }
}

/// Job to generate captions for an already-published video.
///
/// Carries the video ID only; the playable URL and language are re-derived
/// from the current record when the job runs, so the payload cannot go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionJob {
    /// Unique job ID
    pub job_id: JobId,
    /// Video record to caption
    pub video_id: VideoId,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl CaptionJob {
    pub fn new(video_id: VideoId) -> Self {
        Self {
            job_id: JobId::new(),
            video_id,
            created_at: Utc::now(),
        }
    }

    /// Idempotency key for deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("caption:{}", self.video_id)
    }
}

/// Envelope stored on the stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    /// Transcode a raw upload and publish URLs on the record
    Transcode(TranscodeJob),
    /// Transcribe a ready video into caption segments
    Caption(CaptionJob),
}

impl QueueJob {
    pub fn job_id(&self) -> &JobId {
        match self {
            QueueJob::Transcode(j) => &j.job_id,
            QueueJob::Caption(j) => &j.job_id,
        }
    }

    pub fn video_id(&self) -> &VideoId {
        match self {
            QueueJob::Transcode(j) => &j.video_id,
            QueueJob::Caption(j) => &j.video_id,
        }
    }

    pub fn idempotency_key(&self) -> String {
        match self {
            QueueJob::Transcode(j) => j.idempotency_key(),
            QueueJob::Caption(j) => j.idempotency_key(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QueueJob::Transcode(_) => "transcode",
            QueueJob::Caption(_) => "caption",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_job_serde_roundtrip() {
        let job = TranscodeJob::new(VideoId::from_string("vid-1"), "abc_clip.mov");
        let wrapper = QueueJob::Transcode(job.clone());

        let json = serde_json::to_string(&wrapper).expect("serialize QueueJob");
        assert!(json.contains("\"type\":\"transcode\""));

        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");
        match decoded {
            QueueJob::Transcode(j) => {
                assert_eq!(j.job_id, job.job_id);
                assert_eq!(j.video_id, job.video_id);
                assert_eq!(j.raw_file_path, "abc_clip.mov");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_idempotency_keys_are_per_video() {
        let video_id = VideoId::from_string("vid-1");
        let a = TranscodeJob::new(video_id.clone(), "a.mov");
        let b = TranscodeJob::new(video_id.clone(), "a.mov");
        // Two submissions for the same video dedupe to the same key
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert_ne!(a.idempotency_key(), CaptionJob::new(video_id).idempotency_key());
    }
}
