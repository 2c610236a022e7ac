//! Worker error taxonomy.
//!
//! Every job handler classifies its failures at the job boundary:
//! - `NotFound` / `PreconditionFailed`: nothing to do, acknowledge and drop
//!   (these are expected under at-least-once redelivery and never alerted)
//! - `ResourceMissing` / `ExternalTool` / `Timeout`: the job itself failed
//! - everything else: transient infrastructure, left to queue redelivery

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Expected resource missing: {0}")]
    ResourceMissing(String),

    #[error("External tool failed: {0}")]
    ExternalTool(String),

    #[error("External call timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] clipsmith_storage::StorageError),

    #[error("Store error: {0}")]
    Store(#[from] clipsmith_store::StoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] clipsmith_queue::QueueError),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<clipsmith_media::MediaError> for WorkerError {
    fn from(e: clipsmith_media::MediaError) -> Self {
        match e {
            clipsmith_media::MediaError::Timeout(secs) => {
                Self::Timeout(format!("media engine call exceeded {secs}s"))
            }
            clipsmith_media::MediaError::FileNotFound(path) => {
                Self::ResourceMissing(path.display().to_string())
            }
            other => Self::ExternalTool(other.to_string()),
        }
    }
}

impl WorkerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn resource_missing(msg: impl Into<String>) -> Self {
        Self::ResourceMissing(msg.into())
    }

    pub fn external_tool(msg: impl Into<String>) -> Self {
        Self::ExternalTool(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Redelivery-safe no-op: acknowledge without treating as a failure.
    pub fn is_drop(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::PreconditionFailed(_))
    }

    /// Failure of the job's own work, as opposed to the infrastructure
    /// around it. For transcode jobs these mark the video FAILED.
    pub fn is_job_fault(&self) -> bool {
        matches!(
            self,
            Self::ResourceMissing(_) | Self::ExternalTool(_) | Self::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipsmith_media::MediaError;

    #[test]
    fn test_media_error_classification() {
        let timeout: WorkerError = MediaError::Timeout(300).into();
        assert!(matches!(timeout, WorkerError::Timeout(_)));
        assert!(timeout.is_job_fault());

        let failed: WorkerError =
            MediaError::ffmpeg_failed("exit 1", None, Some(1)).into();
        assert!(matches!(failed, WorkerError::ExternalTool(_)));
        assert!(failed.is_job_fault());
    }

    #[test]
    fn test_infra_errors_are_not_job_faults() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down");
        let err: WorkerError = io.into();
        assert!(!err.is_job_fault());
        assert!(!err.is_drop());
    }
}
