//! Center-crop and nearest-neighbor resize.
//!
//! All coordinate mapping is integer floor division: destination pixel `x`
//! samples source column `region.x + x * region.width / out_width`. There is
//! no interpolation and no floating point, and channel bytes are copied
//! verbatim, so any fixed-stride pixel format works.

use crate::{ImageBuffer, ImageError};
use palm_base::Allocator;

/// A pixel rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The part of this rectangle inside a `width` x `height` image.
    pub fn clamp_to(&self, width: u32, height: u32) -> CropRect {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.x.saturating_add(self.width).min(width);
        let y1 = self.y.saturating_add(self.height).min(height);
        CropRect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// The largest square centered in a `width` x `height` image.
pub fn center_square(width: u32, height: u32) -> CropRect {
    let crop = width.min(height);
    CropRect::new((width - crop) / 2, (height - crop) / 2, crop, crop)
}

/// Center-crop `src` to a square and resize it to `target_size` x `target_size`.
///
/// The output has the same pixel format as `src` and is leased from
/// `allocator`; `ImageError::Alloc` means neither pool had room and the
/// frame should be skipped. `src` is left untouched.
pub fn resample(
    src: &ImageBuffer,
    target_size: u32,
    allocator: &Allocator,
) -> Result<ImageBuffer, ImageError> {
    let square = center_square(src.width(), src.height());
    resize_region(src, square, target_size, target_size, allocator)
}

/// Cut `region` out of `src` and resize it to `out_width` x `out_height`.
///
/// The region is clamped to the image first; an empty result is an error.
pub fn resize_region(
    src: &ImageBuffer,
    region: CropRect,
    out_width: u32,
    out_height: u32,
    allocator: &Allocator,
) -> Result<ImageBuffer, ImageError> {
    if out_width == 0 || out_height == 0 {
        return Err(ImageError::InvalidSize(format!(
            "target size must be non-zero, got {out_width}x{out_height}"
        )));
    }
    let region = region.clamp_to(src.width(), src.height());
    if region.is_empty() {
        return Err(ImageError::InvalidSize(format!(
            "crop region {region:?} lies outside the {}x{} image",
            src.width(),
            src.height()
        )));
    }

    let mut dst = ImageBuffer::alloc(allocator, out_width, out_height, src.format())?;

    let bpp = src.bytes_per_pixel();
    let src_stride = src.stride();
    let dst_stride = dst.stride();
    let src_data = src.data();
    let dst_data = dst.data_mut();

    for (y, dst_row) in dst_data.chunks_exact_mut(dst_stride).enumerate() {
        let sy = region.y as u64 + y as u64 * region.height as u64 / out_height as u64;
        let src_row = &src_data[sy as usize * src_stride..][..src_stride];

        for (x, dst_px) in dst_row.chunks_exact_mut(bpp).enumerate() {
            let sx = region.x as u64 + x as u64 * region.width as u64 / out_width as u64;
            let start = sx as usize * bpp;
            dst_px.copy_from_slice(&src_row[start..start + bpp]);
        }
    }

    Ok(dst)
}
