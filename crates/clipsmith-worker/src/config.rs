//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Per-call timeout for external media tool invocations
    pub engine_timeout: Duration,
    /// Work directory for per-job scratch files
    pub work_dir: String,
    /// How often the worker should scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery)
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Language captions are transcribed in
    pub caption_language: String,
    /// Offset into the clip for the representative thumbnail frame
    pub thumbnail_offset_seconds: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            engine_timeout: Duration::from_secs(600),
            work_dir: "/tmp/clipsmith".to_string(),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(30),
            caption_language: "en".to_string(),
            thumbnail_offset_seconds: 1.0,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            engine_timeout: Duration::from_secs(
                std::env::var("WORKER_ENGINE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/clipsmith".to_string()),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            caption_language: std::env::var("CAPTION_LANGUAGE")
                .unwrap_or_else(|_| "en".to_string()),
            thumbnail_offset_seconds: std::env::var("THUMBNAIL_OFFSET_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        }
    }
}
