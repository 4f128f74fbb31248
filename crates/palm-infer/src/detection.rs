use crate::InferError;
use palm_base::{Rect, Vec2};
use palm_image::ImageBuffer;

/// A landmark on a detected hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub position: Vec2<f32>,
    pub confidence: f32,
}

/// One detected hand, in pixel coordinates of the image it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Rect<f32>,
    pub score: f32,
    pub keypoints: Vec<Keypoint>,
}

impl Detection {
    pub fn new(bbox: Rect<f32>, score: f32) -> Self {
        Self {
            bbox,
            score,
            keypoints: Vec::new(),
        }
    }

    pub fn with_keypoints(mut self, keypoints: Vec<Keypoint>) -> Self {
        self.keypoints = keypoints;
        self
    }
}

/// Finds hands in an image.
///
/// An empty result means nothing was found and is not an error.
#[allow(async_fn_in_trait)]
pub trait Detector {
    async fn detect(&mut self, image: &ImageBuffer) -> Result<Vec<Detection>, InferError>;
}
