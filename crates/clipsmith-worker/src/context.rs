//! Shared dependencies for job handlers.

use std::sync::Arc;

use clipsmith_media::MediaEngine;
use clipsmith_storage::BlobStore;
use clipsmith_store::{CaptionStore, VideoStore};

use crate::config::WorkerConfig;
use crate::stt::Transcriber;

/// Everything a job handler needs, wired once at startup.
///
/// All boundaries are trait objects so tests can swap in stubs for the
/// external pieces (media engine, speech-to-text) while keeping the real
/// handler code paths.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub videos: Arc<dyn VideoStore>,
    pub captions: Arc<dyn CaptionStore>,
    pub storage: Arc<dyn BlobStore>,
    pub engine: Arc<dyn MediaEngine>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl ProcessingContext {
    pub fn new(
        config: WorkerConfig,
        videos: Arc<dyn VideoStore>,
        captions: Arc<dyn CaptionStore>,
        storage: Arc<dyn BlobStore>,
        engine: Arc<dyn MediaEngine>,
        transcriber: Arc<dyn Transcriber>,
    ) -> Self {
        Self {
            config,
            videos,
            captions,
            storage,
            engine,
            transcriber,
        }
    }
}
