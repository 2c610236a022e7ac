//! Caption segment model.

use serde::{Deserialize, Serialize};

use crate::ids::{CaptionId, VideoId};

/// One timed caption segment for a video.
///
/// Segments are written in batches by the caption worker and never mutated
/// afterwards; regenerating captions swaps out the whole set for the video
/// atomically. Invariant: `end_time > start_time` (both in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionSegment {
    pub id: CaptionId,
    pub video_id: VideoId,
    pub text: String,
    /// Segment start offset in seconds
    pub start_time: f64,
    /// Segment end offset in seconds
    pub end_time: f64,
    /// BCP-47-ish language code, e.g. "en"
    pub language: String,
}

impl CaptionSegment {
    pub fn new(
        video_id: VideoId,
        text: impl Into<String>,
        start_time: f64,
        end_time: f64,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: CaptionId::new(),
            video_id,
            text: text.into(),
            start_time,
            end_time,
            language: language.into(),
        }
    }
}
