//! Image buffers, JPEG decoding and nearest-neighbor resampling for the palm pipeline.
//!
//! Pixel data is stored row-major and interleaved, `bytes_per_pixel` bytes per
//! pixel, in memory leased from a `palm_base::Allocator`.

pub mod buffer;
pub mod decode;
pub mod error;
pub mod pixelformat;
pub mod resample;

pub use buffer::ImageBuffer;
pub use decode::{Decoder, JpegDecoder};
pub use error::ImageError;
pub use pixelformat::PixelFormat;
pub use resample::{CropRect, center_square, resample, resize_region};
