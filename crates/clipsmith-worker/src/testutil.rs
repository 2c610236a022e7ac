//! Stub implementations of the external boundaries for handler tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use clipsmith_media::{MediaEngine, MediaError, MediaResult, ProbeInfo};
use clipsmith_storage::FsStore;
use clipsmith_store::MemoryStore;

use crate::config::WorkerConfig;
use crate::context::ProcessingContext;
use crate::error::WorkerResult;
use crate::stt::{Transcriber, TranscriptWord};

/// Media engine stub that writes marker bytes instead of shelling out.
pub struct StubEngine {
    fail: bool,
    duration: f64,
    transcode_calls: AtomicUsize,
    audio_calls: AtomicUsize,
    last_frame_offset: Mutex<Option<f64>>,
}

impl StubEngine {
    pub fn new(duration: f64, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            duration,
            transcode_calls: AtomicUsize::new(0),
            audio_calls: AtomicUsize::new(0),
            last_frame_offset: Mutex::new(None),
        })
    }

    pub fn transcode_calls(&self) -> usize {
        self.transcode_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }

    pub fn last_frame_offset(&self) -> Option<f64> {
        *self.last_frame_offset.lock().unwrap()
    }

    fn check(&self) -> MediaResult<()> {
        if self.fail {
            Err(MediaError::ffmpeg_failed("stub engine failure", None, Some(1)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MediaEngine for StubEngine {
    async fn probe(&self, _input: &Path) -> MediaResult<ProbeInfo> {
        self.check()?;
        Ok(ProbeInfo {
            duration: self.duration,
            width: 1280,
            height: 720,
            codec: "h264".to_string(),
        })
    }

    async fn transcode(&self, _input: &Path, output: &Path) -> MediaResult<()> {
        self.check()?;
        self.transcode_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(output, b"transcoded")?;
        Ok(())
    }

    async fn extract_frame(
        &self,
        _input: &Path,
        output: &Path,
        offset_seconds: f64,
    ) -> MediaResult<()> {
        self.check()?;
        *self.last_frame_offset.lock().unwrap() = Some(offset_seconds);
        std::fs::write(output, b"jpeg")?;
        Ok(())
    }

    async fn extract_audio(&self, _input: &Path, output: &Path) -> MediaResult<()> {
        self.check()?;
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        std::fs::write(output, b"pcm")?;
        Ok(())
    }
}

/// Transcriber stub returning a canned word list.
pub struct StubTranscriber {
    words: Vec<TranscriptWord>,
    calls: AtomicUsize,
}

impl StubTranscriber {
    pub fn with_words(words: Vec<TranscriptWord>) -> Arc<Self> {
        Arc::new(Self {
            words,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(
        &self,
        _audio: &Path,
        _language: &str,
    ) -> WorkerResult<Vec<TranscriptWord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.words.clone())
    }
}

/// Shorthand for building timed words in tests.
pub fn words(texts: &[&str]) -> Vec<TranscriptWord> {
    texts
        .iter()
        .enumerate()
        .map(|(i, t)| TranscriptWord {
            text: (*t).to_string(),
            start_ms: (i as u64) * 500,
            end_ms: (i as u64) * 500 + 400,
        })
        .collect()
}

/// A fully wired context over in-memory stores, filesystem storage in a
/// tempdir, and stub external boundaries.
pub struct TestContext {
    pub ctx: ProcessingContext,
    pub engine: Arc<StubEngine>,
    pub transcriber: Arc<StubTranscriber>,
    _storage_dir: tempfile::TempDir,
    _work_dir: tempfile::TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(StubEngine::new(30.0, false), StubTranscriber::with_words(Vec::new()))
    }

    pub fn failing_engine() -> Self {
        Self::build(StubEngine::new(30.0, true), StubTranscriber::with_words(Vec::new()))
    }

    pub fn with_duration(duration: f64) -> Self {
        Self::build(StubEngine::new(duration, false), StubTranscriber::with_words(Vec::new()))
    }

    pub fn with_transcript(words: Vec<TranscriptWord>) -> Self {
        Self::build(StubEngine::new(30.0, false), StubTranscriber::with_words(words))
    }

    fn build(engine: Arc<StubEngine>, transcriber: Arc<StubTranscriber>) -> Self {
        let storage_dir = tempfile::tempdir().expect("storage tempdir");
        let work_dir = tempfile::tempdir().expect("work tempdir");

        let store = Arc::new(MemoryStore::new());
        let config = WorkerConfig {
            work_dir: work_dir.path().to_string_lossy().into_owned(),
            ..WorkerConfig::default()
        };

        let ctx = ProcessingContext::new(
            config,
            store.clone(),
            store,
            Arc::new(FsStore::new(storage_dir.path(), "/uploads")),
            engine.clone(),
            transcriber.clone(),
        );

        Self {
            ctx,
            engine,
            transcriber,
            _storage_dir: storage_dir,
            _work_dir: work_dir,
        }
    }
}
