//! Shared data models for the Clipsmith backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and the processing status state machine
//! - Caption segments
//! - Opaque identifiers (video, caption, job)

pub mod caption;
pub mod ids;
pub mod video;

pub use caption::CaptionSegment;
pub use ids::{CaptionId, JobId, VideoId};
pub use video::{InvalidTransition, VideoRecord, VideoStatus};
