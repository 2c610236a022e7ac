//! HTTP API for the Clipsmith media pipeline.
//!
//! This crate provides:
//! - Upload intake (multipart) that persists the raw file and enqueues
//!   transcoding
//! - Caption generation requests and caption listing
//! - Video status reads for frontend polling

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
