//! The external transcoding engine boundary.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::{probe_video, ProbeInfo};

/// Target width for web-playable output; height follows the aspect ratio.
pub const TRANSCODE_SCALE_WIDTH: u32 = 640;

/// Encoder preset for transcoding.
pub const TRANSCODE_PRESET: &str = "veryfast";

/// Media engine operations the workers depend on.
///
/// `FfmpegEngine` is the production implementation; tests substitute stubs
/// so job handlers can be exercised without the external binaries.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Probe a media file for duration and stream information.
    async fn probe(&self, input: &Path) -> MediaResult<ProbeInfo>;

    /// Transcode to a normalized, web-playable file (h264/aac, bounded width).
    async fn transcode(&self, input: &Path, output: &Path) -> MediaResult<()>;

    /// Extract a single still frame at `offset_seconds` into the clip.
    async fn extract_frame(&self, input: &Path, output: &Path, offset_seconds: f64)
        -> MediaResult<()>;

    /// Extract an audio-only track.
    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()>;
}

/// FFmpeg-backed media engine.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    /// Per-call timeout in seconds; unbounded when `None`
    timeout_secs: Option<u64>,
}

impl FfmpegEngine {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Bound each engine call by a timeout, distinct from the queue's
    /// redelivery timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        match self.timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe(&self, input: &Path) -> MediaResult<ProbeInfo> {
        // ffprobe gets the same bound as the ffmpeg calls
        match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), probe_video(input))
                .await
                .map_err(|_| MediaError::Timeout(secs))?,
            None => probe_video(input).await,
        }
    }

    async fn transcode(&self, input: &Path, output: &Path) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output)
            .video_codec("libx264")
            .audio_codec("aac")
            .preset(TRANSCODE_PRESET)
            .video_filter(format!("scale={}:-2", TRANSCODE_SCALE_WIDTH));

        self.runner().run(&cmd).await
    }

    async fn extract_frame(
        &self,
        input: &Path,
        output: &Path,
        offset_seconds: f64,
    ) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(input, output).seek(offset_seconds).single_frame();

        self.runner().run(&cmd).await
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> MediaResult<()> {
        // 16 kHz mono PCM keeps speech-to-text uploads small and uniform
        let cmd = FfmpegCommand::new(input, output)
            .no_video()
            .audio_codec("pcm_s16le")
            .output_arg("-ar")
            .output_arg("16000")
            .output_arg("-ac")
            .output_arg("1");

        self.runner().run(&cmd).await
    }
}
