//! Redis Streams work queue.
//!
//! This crate provides:
//! - Job contracts for the two pipeline job types (transcode, caption)
//! - At-least-once delivery via consumer groups
//! - Crash recovery by claiming idle pending deliveries
//! - Retry counters and a dead-letter stream

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{CaptionJob, QueueJob, TranscodeJob};
pub use queue::{JobQueue, QueueConfig};
