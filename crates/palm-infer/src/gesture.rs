use crate::{Detection, InferError};
use palm_image::ImageBuffer;

/// A recognized gesture and its confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub category: String,
    pub score: f32,
}

impl Gesture {
    pub fn new(category: impl Into<String>, score: f32) -> Self {
        Self {
            category: category.into(),
            score,
        }
    }
}

/// Labels the hands found by a [`Detector`](crate::Detector).
///
/// Returns at most one gesture per detection; implementations may drop
/// detections they are not confident about.
#[allow(async_fn_in_trait)]
pub trait Classifier {
    async fn classify(
        &mut self,
        image: &ImageBuffer,
        detections: &[Detection],
    ) -> Result<Vec<Gesture>, InferError>;
}
