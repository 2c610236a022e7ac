//! Request handlers.

pub mod captions;
pub mod health;
pub mod videos;

pub use captions::*;
pub use health::*;
pub use videos::*;
