use crate::pixelformat::rgb888_to_rgb565;
use crate::{ImageBuffer, ImageError, PixelFormat};
use palm_base::Allocator;

/// Turns compressed frame bytes into an [`ImageBuffer`].
pub trait Decoder {
    /// Decode `data` into an image of the requested pixel format.
    fn decode(&self, data: &[u8], format: PixelFormat) -> Result<ImageBuffer, ImageError>;
}

/// Software JPEG decoder backed by the `image` crate.
///
/// Decoded pixels are charged to the decoder's allocator, so a frame that
/// does not fit in either pool fails with `ImageError::Alloc`.
#[derive(Clone, Debug)]
pub struct JpegDecoder {
    allocator: Allocator,
}

impl JpegDecoder {
    pub fn new(allocator: Allocator) -> Self {
        Self { allocator }
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    fn lease(
        &self,
        width: u32,
        height: u32,
        format: PixelFormat,
        raw: Vec<u8>,
    ) -> Result<ImageBuffer, ImageError> {
        let bytes = raw.len();
        let data = self
            .allocator
            .adopt(raw)
            .ok_or(ImageError::Alloc { bytes })?;
        ImageBuffer::new(width, height, format, data)
    }
}

impl Decoder for JpegDecoder {
    fn decode(&self, data: &[u8], format: PixelFormat) -> Result<ImageBuffer, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Decode("empty frame".to_string()));
        }

        let img =
            crates_image::load_from_memory_with_format(data, crates_image::ImageFormat::Jpeg)?;

        match format {
            PixelFormat::Rgb888 => {
                let rgb = img.into_rgb8();
                let (width, height) = rgb.dimensions();
                check_dimensions(width, height)?;
                self.lease(width, height, format, rgb.into_raw())
            }
            PixelFormat::Gray8 => {
                let luma = img.into_luma8();
                let (width, height) = luma.dimensions();
                check_dimensions(width, height)?;
                self.lease(width, height, format, luma.into_raw())
            }
            PixelFormat::Rgb565 => {
                let rgb = img.into_rgb8();
                let (width, height) = rgb.dimensions();
                check_dimensions(width, height)?;
                let mut out = ImageBuffer::alloc(&self.allocator, width, height, format)?;
                for (dst, src) in out
                    .data_mut()
                    .chunks_exact_mut(2)
                    .zip(rgb.as_raw().chunks_exact(3))
                {
                    dst.copy_from_slice(&rgb888_to_rgb565(src[0], src[1], src[2]));
                }
                Ok(out)
            }
        }
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<(), ImageError> {
    if width == 0 || height == 0 {
        return Err(ImageError::Decode(format!(
            "decoded image has non-positive dimensions {width}x{height}"
        )));
    }
    Ok(())
}
