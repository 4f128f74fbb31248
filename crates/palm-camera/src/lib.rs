//! Compressed frame sources for the palm pipeline.
//!
//! A [`FrameSource`] hands out JPEG frames one at a time and takes them back
//! once the caller is done with the bytes. Sources hold a fixed number of
//! frame slots, like a camera driver with a fixed set of frame buffers.

pub mod config;
pub mod directory;
pub mod error;
pub mod frame;
pub mod slots;
pub mod traits;

#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use config::CameraConfig;
pub use directory::DirectorySource;
pub use error::CameraError;
pub use frame::CompressedFrame;
pub use slots::FrameSlots;
pub use traits::FrameSource;

#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Source;
