//! Video record and processing status state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::VideoId;

/// Video processing status.
///
/// The transcode pipeline drives `Uploading -> Processing -> {Ready, Failed}`.
/// `Ready` and `Failed` are terminal; captioning only runs on `Ready` videos
/// and never changes the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    /// Raw file persisted, transcode job enqueued but not yet picked up
    #[default]
    Uploading,
    /// A worker has claimed the transcode job
    Processing,
    /// Playable output and thumbnail published
    Ready,
    /// Transcode failed; requires re-upload
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Uploading => "UPLOADING",
            VideoStatus::Processing => "PROCESSING",
            VideoStatus::Ready => "READY",
            VideoStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state for the transcode pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::Failed)
    }

    /// Check if a dequeued transcode job may act on a record in this state.
    ///
    /// `Processing` stays eligible so a job redelivered after a worker crash
    /// can re-run; output paths are deterministic, so a re-run overwrites its
    /// own partial outputs rather than corrupting anything.
    pub fn is_transcode_eligible(&self) -> bool {
        matches!(self, VideoStatus::Uploading | VideoStatus::Processing)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attempted status transition that the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid video status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: VideoStatus,
    pub to: VideoStatus,
}

/// Persistent video record.
///
/// Created by upload intake in `Uploading`; mutated only by the transcode
/// worker afterwards. Invariant: `url` and `thumbnail_url` are both `Some`
/// iff `status == Ready`, and `duration_seconds > 0` only at `Ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    /// Owning creator (user ID); assigned at intake, never touched here
    pub creator_id: String,
    #[serde(default)]
    pub status: VideoStatus,
    /// Public playable URL; set atomically with the Ready transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Public thumbnail URL; set atomically with the Ready transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Probed duration in seconds; 0 until Ready
    #[serde(default)]
    pub duration_seconds: f64,
    /// Failure detail for diagnostics (if Failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRecord {
    /// Create a new record in the initial `Uploading` state.
    pub fn new(
        id: VideoId,
        title: impl Into<String>,
        description: impl Into<String>,
        creator_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: description.into(),
            creator_id: creator_id.into(),
            status: VideoStatus::Uploading,
            url: None,
            thumbnail_url: None,
            duration_seconds: 0.0,
            error_message: None,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to `Processing`.
    ///
    /// Pure transform: consumes the record and returns the updated copy.
    pub fn mark_processing(mut self) -> Result<Self, InvalidTransition> {
        if !self.status.is_transcode_eligible() {
            return Err(InvalidTransition {
                from: self.status,
                to: VideoStatus::Processing,
            });
        }
        self.status = VideoStatus::Processing;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Transition to `Ready`, carrying both URLs and the probed duration
    /// atomically. No partially-ready record is ever constructed.
    pub fn mark_ready(
        mut self,
        url: impl Into<String>,
        thumbnail_url: impl Into<String>,
        duration_seconds: f64,
    ) -> Result<Self, InvalidTransition> {
        if self.status != VideoStatus::Processing {
            return Err(InvalidTransition {
                from: self.status,
                to: VideoStatus::Ready,
            });
        }
        self.status = VideoStatus::Ready;
        self.url = Some(url.into());
        self.thumbnail_url = Some(thumbnail_url.into());
        self.duration_seconds = duration_seconds;
        self.error_message = None;
        self.updated_at = Utc::now();
        Ok(self)
    }

    /// Transition to `Failed`. No partial URLs survive this path.
    pub fn mark_failed(mut self, reason: impl Into<String>) -> Result<Self, InvalidTransition> {
        if self.status.is_terminal() {
            return Err(InvalidTransition {
                from: self.status,
                to: VideoStatus::Failed,
            });
        }
        self.status = VideoStatus::Failed;
        self.url = None;
        self.thumbnail_url = None;
        self.duration_seconds = 0.0;
        self.error_message = Some(reason.into());
        self.updated_at = Utc::now();
        Ok(self)
    }
}
