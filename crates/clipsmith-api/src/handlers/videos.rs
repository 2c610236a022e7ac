//! Upload intake and video status handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use clipsmith_models::{VideoId, VideoRecord};
use clipsmith_queue::TranscodeJob;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Container formats accepted for upload.
const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Video record as served to clients.
#[derive(Serialize)]
pub struct VideoResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub views: u64,
    pub likes: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<VideoRecord> for VideoResponse {
    fn from(r: VideoRecord) -> Self {
        Self {
            id: r.id.to_string(),
            title: r.title,
            description: r.description,
            creator_id: r.creator_id,
            status: r.status.as_str().to_string(),
            url: r.url,
            thumbnail_url: r.thumbnail_url,
            duration_seconds: r.duration_seconds,
            error_message: r.error_message,
            views: r.views,
            likes: r.likes,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Accept a raw upload, persist it, and enqueue transcoding.
///
/// Multipart fields: `file` (required), `title` (required), `description`,
/// `creator_id` (required). Responds 202; the record starts at UPLOADING and
/// the worker moves it from there.
pub async fn upload_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<VideoResponse>)> {
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut creator_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                file_name = field.file_name().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
                file_bytes = Some(bytes.to_vec());
            }
            "title" => {
                title = Some(read_text(field).await?);
            }
            "description" => {
                description = read_text(field).await?;
            }
            "creator_id" => {
                creator_id = Some(read_text(field).await?);
            }
            other => {
                warn!("Ignoring unexpected multipart field: {}", other);
            }
        }
    }

    let file_name = file_name.ok_or_else(|| ApiError::bad_request("Missing file"))?;
    let file_bytes = file_bytes.ok_or_else(|| ApiError::bad_request("Missing file"))?;
    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing title"))?;
    let creator_id = creator_id
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing creator_id"))?;

    validate_extension(&file_name)?;
    if file_bytes.is_empty() {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }

    let raw_key = raw_key_for(&file_name);
    state.storage.save(&raw_key, &file_bytes).await?;

    let record = VideoRecord::new(VideoId::new(), title, description, creator_id);
    state.videos.insert(&record).await?;

    let job = TranscodeJob::new(record.id.clone(), raw_key);
    state.queue.enqueue_transcode(job).await?;

    info!(
        "Accepted upload {} for video {} ({} bytes)",
        file_name,
        record.id,
        file_bytes.len()
    );

    Ok((StatusCode::ACCEPTED, Json(record.into())))
}

/// Fetch a video record.
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoResponse>> {
    let id = VideoId::from_string(video_id);
    let record = state
        .videos
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Video {id} not found")))?;

    Ok(Json(record.into()))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ApiResult<String> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {e}")))
}

fn validate_extension(file_name: &str) -> ApiResult<()> {
    let extension = file_name
        .rsplit('.')
        .next()
        .filter(|e| *e != file_name)
        .map(str::to_lowercase)
        .ok_or_else(|| ApiError::bad_request("File has no extension"))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ApiError::bad_request(format!(
            "Unsupported file type .{extension}; allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}

/// Storage key for a raw upload: a fresh UUID prefix keeps concurrent uploads
/// of the same filename from colliding.
fn raw_key_for(file_name: &str) -> String {
    // Client filenames may carry path components; keep only the final one
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .replace(' ', "_");
    format!("{}_{}", Uuid::new_v4(), base)
}
