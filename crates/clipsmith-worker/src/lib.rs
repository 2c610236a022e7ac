//! Media processing worker.
//!
//! This crate provides:
//! - Job executor consuming the transcode/caption streams
//! - The transcode handler (normalize, thumbnail, publish)
//! - The caption handler (audio extraction, transcription, segmentation)
//! - Speech-to-text client
//! - Graceful shutdown

pub mod captions;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod stt;
pub mod transcode;

#[cfg(test)]
mod testutil;

pub use captions::{handle_caption, segment_words};
pub use config::WorkerConfig;
pub use context::ProcessingContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use stt::{AssemblyAiClient, Transcriber, TranscriptWord};
pub use transcode::handle_transcode;
