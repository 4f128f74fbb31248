use crate::InferError;
use palm_image::{ImageBuffer, PixelFormat};

/// Convert an RGB888 image to planar CHW floats scaled to [0, 1].
///
/// The result has `3 * height * width` elements, channel planes in R, G, B order.
pub fn to_nchw(image: &ImageBuffer) -> Result<Vec<f32>, InferError> {
    image
        .format()
        .ensure_format(PixelFormat::Rgb888)
        .map_err(InferError::Image)?;

    let plane = image.width() as usize * image.height() as usize;
    let mut out = vec![0.0f32; 3 * plane];

    for (i, px) in image.data().chunks_exact(3).enumerate() {
        for ch in 0..3 {
            out[ch * plane + i] = px[ch] as f32 / 255.0;
        }
    }

    Ok(out)
}
