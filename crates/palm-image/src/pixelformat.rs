use crate::ImageError;

/// Interleaved pixel layouts with a fixed number of bytes per pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// R, G, B, one byte each.
    Rgb888,
    /// 5-6-5 bit RGB packed little-endian into two bytes.
    Rgb565,
    /// One luma byte.
    Gray8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb888 => 3,
            PixelFormat::Rgb565 => 2,
            PixelFormat::Gray8 => 1,
        }
    }

    /// Byte length of a `width` x `height` image, `None` on overflow.
    pub fn frame_len(&self, width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(self.bytes_per_pixel())
    }

    pub fn ensure_format(&self, expected: PixelFormat) -> Result<(), ImageError> {
        if *self != expected {
            return Err(ImageError::Format(format!(
                "expected {:?} format, got {:?}",
                expected, self
            )));
        }
        Ok(())
    }
}

/// Pack an RGB triple into little-endian RGB565.
pub(crate) fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> [u8; 2] {
    let packed = ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3);
    packed.to_le_bytes()
}
