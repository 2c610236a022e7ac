//! FFmpeg CLI wrapper for the Clipsmith media pipeline.
//!
//! This crate provides:
//! - The `MediaEngine` boundary the workers call into
//! - Type-safe FFmpeg command building
//! - An FFmpeg/FFprobe implementation with per-call timeouts

pub mod command;
pub mod engine;
pub mod error;
pub mod probe;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, ProbeInfo};
