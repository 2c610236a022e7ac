//! Speech-to-text boundary and the hosted transcription client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// A single recognized word with millisecond timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptWord {
    pub text: String,
    #[serde(rename = "start")]
    pub start_ms: u64,
    #[serde(rename = "end")]
    pub end_ms: u64,
}

/// Speech-to-text boundary.
///
/// Takes a local audio file and returns word-level timestamps; segmentation
/// into caption lines happens on our side.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path, language: &str) -> WorkerResult<Vec<TranscriptWord>>;
}

/// Client for the AssemblyAI hosted transcription API.
///
/// Flow: upload the audio bytes, create a transcript job, then poll until
/// the service reports `completed` or `error`.
pub struct AssemblyAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    poll_deadline: Duration,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    id: String,
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    words: Option<Vec<TranscriptWord>>,
}

impl AssemblyAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.assemblyai.com".to_string(),
            poll_interval: Duration::from_secs(3),
            poll_deadline: Duration::from_secs(600),
        }
    }

    /// Create from environment variables. Fails fast when the API key is
    /// missing so a misconfigured worker never claims caption jobs.
    pub fn from_env() -> WorkerResult<Self> {
        let api_key = std::env::var("ASSEMBLYAI_API_KEY")
            .map_err(|_| WorkerError::config("ASSEMBLYAI_API_KEY not set"))?;
        let mut client = Self::new(api_key);
        if let Ok(url) = std::env::var("ASSEMBLYAI_BASE_URL") {
            client.base_url = url.trim_end_matches('/').to_string();
        }
        Ok(client)
    }

    async fn upload(&self, audio: &Path) -> WorkerResult<String> {
        let bytes = tokio::fs::read(audio).await?;
        let resp = self
            .http
            .post(format!("{}/v2/upload", self.base_url))
            .header("authorization", &self.api_key)
            .body(bytes)
            .send()
            .await?
            .error_for_status()?;
        let upload: UploadResponse = resp.json().await?;
        Ok(upload.upload_url)
    }

    async fn create_transcript(&self, audio_url: &str, language: &str) -> WorkerResult<String> {
        let resp = self
            .http
            .post(format!("{}/v2/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&serde_json::json!({
                "audio_url": audio_url,
                "language_code": language,
            }))
            .send()
            .await?
            .error_for_status()?;
        let transcript: TranscriptResponse = resp.json().await?;
        Ok(transcript.id)
    }

    async fn poll(&self, transcript_id: &str) -> WorkerResult<Vec<TranscriptWord>> {
        let deadline = tokio::time::Instant::now() + self.poll_deadline;

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(WorkerError::Timeout(format!(
                    "transcription {} did not complete within {}s",
                    transcript_id,
                    self.poll_deadline.as_secs()
                )));
            }

            let resp = self
                .http
                .get(format!("{}/v2/transcript/{}", self.base_url, transcript_id))
                .header("authorization", &self.api_key)
                .send()
                .await?
                .error_for_status()?;
            let transcript: TranscriptResponse = resp.json().await?;

            match transcript.status.as_str() {
                "completed" => {
                    let words = transcript.words.unwrap_or_default();
                    info!(
                        "Transcription {} completed with {} words",
                        transcript_id,
                        words.len()
                    );
                    return Ok(words);
                }
                "error" => {
                    return Err(WorkerError::external_tool(format!(
                        "transcription {} failed: {}",
                        transcript_id,
                        transcript.error.as_deref().unwrap_or("unknown error")
                    )));
                }
                status => {
                    debug!("Transcription {} status: {}", transcript_id, status);
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl Transcriber for AssemblyAiClient {
    async fn transcribe(&self, audio: &Path, language: &str) -> WorkerResult<Vec<TranscriptWord>> {
        let audio_url = self.upload(audio).await?;
        debug!("Uploaded audio for transcription");

        let transcript_id = self.create_transcript(&audio_url, language).await?;
        info!("Created transcription job {}", transcript_id);

        self.poll(&transcript_id).await
    }
}
