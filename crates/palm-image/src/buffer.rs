use crate::{ImageError, PixelFormat};
use palm_base::{Allocator, PoolBuffer};

/// An owned, non-empty image with interleaved pixels.
///
/// A value of this type always holds exactly `width * height *
/// bytes_per_pixel` bytes; failed decodes and allocations are reported as
/// `ImageError` instead of producing an empty buffer. Dropping the image
/// returns its memory to the pool it came from.
#[derive(Debug)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: PoolBuffer,
}

impl ImageBuffer {
    /// Wrap pixel data, checking dimensions against its length.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: PoolBuffer,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidSize(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = format
            .frame_len(width, height)
            .ok_or_else(|| ImageError::InvalidSize(format!("{width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(ImageError::InvalidSize(format!(
                "{width}x{height} {format:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Lease a zeroed image from `allocator`.
    pub fn alloc(
        allocator: &Allocator,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<Self, ImageError> {
        let bytes = format
            .frame_len(width, height)
            .ok_or_else(|| ImageError::InvalidSize(format!("{width}x{height} overflows")))?;
        let data = allocator
            .allocate(bytes)
            .ok_or(ImageError::Alloc { bytes })?;
        Self::new(width, height, format, data)
    }

    /// Build an image from a plain vector not accounted to any pool.
    pub fn from_vec(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        Self::new(width, height, format, PoolBuffer::unpooled(data))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of the pixel at `(x, y)`, `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.bytes_per_pixel();
        let start = y as usize * self.stride() + x as usize * bpp;
        Some(&self.data[start..start + bpp])
    }
}
