//! Caption request and listing handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use clipsmith_models::{CaptionSegment, VideoId, VideoStatus};
use clipsmith_queue::{CaptionJob, QueueError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CaptionRequest {
    pub creator_id: String,
}

#[derive(Serialize)]
pub struct CaptionQueuedResponse {
    pub video_id: String,
    pub status: &'static str,
}

/// One caption line as served to clients.
#[derive(Serialize)]
pub struct CaptionSegmentResponse {
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub language: String,
}

impl From<CaptionSegment> for CaptionSegmentResponse {
    fn from(s: CaptionSegment) -> Self {
        Self {
            id: s.id.to_string(),
            video_id: s.video_id.to_string(),
            text: s.text,
            start_time: s.start_time,
            end_time: s.end_time,
            language: s.language,
        }
    }
}

/// Enqueue caption generation for a READY video owned by the caller.
///
/// Responds 202; segments become visible on the listing endpoint once the
/// worker finishes. A request while an identical job is in flight is a 409.
pub async fn request_captions(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(req): Json<CaptionRequest>,
) -> ApiResult<(StatusCode, Json<CaptionQueuedResponse>)> {
    let id = VideoId::from_string(video_id);
    let record = state
        .videos
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Video {id} not found")))?;

    if record.creator_id != req.creator_id {
        return Err(ApiError::forbidden("Only the creator can request captions"));
    }
    if record.status != VideoStatus::Ready {
        return Err(ApiError::conflict(format!(
            "Video is {}, captions need READY",
            record.status
        )));
    }

    match state.queue.enqueue_caption(CaptionJob::new(id.clone())).await {
        Ok(_) => {}
        Err(QueueError::EnqueueFailed(_)) => {
            return Err(ApiError::conflict("Caption generation already in progress"));
        }
        Err(e) => return Err(e.into()),
    }

    info!("Queued caption generation for video {}", id);

    Ok((
        StatusCode::ACCEPTED,
        Json(CaptionQueuedResponse {
            video_id: id.to_string(),
            status: "queued",
        }),
    ))
}

/// List caption segments for a video, ordered by start time.
pub async fn list_captions(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Vec<CaptionSegmentResponse>>> {
    let id = VideoId::from_string(video_id);
    if state.videos.get(&id).await?.is_none() {
        return Err(ApiError::not_found(format!("Video {id} not found")));
    }

    let segments = state.captions.get_by_video(&id).await?;
    Ok(Json(segments.into_iter().map(Into::into).collect()))
}
