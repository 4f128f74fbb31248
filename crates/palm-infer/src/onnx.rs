//! ONNX Runtime backed [`Detector`] and [`Classifier`].

use crate::postprocess::{decode_hand_output, softmax};
use crate::preprocess::to_nchw;
use crate::{Classifier, Detection, Detector, Gesture, InferError};
use ndarray::Array4;
use ort::{inputs, session::Session, value::TensorRef};
use palm_base::{Allocator, Vec2};
use palm_image::{CropRect, ImageBuffer, resize_region};
use std::path::{Path, PathBuf};

/// Where to load a model from.
pub enum ModelSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

fn load_session(model: ModelSource) -> Result<Session, InferError> {
    let builder = Session::builder().map_err(|e| {
        InferError::Backend(format!("failed to create session builder: {e}"))
    })?;

    match model {
        ModelSource::File(path) => builder.commit_from_file(&path).map_err(|e| {
            InferError::ModelLoad(format!("failed to load model {}: {e}", path.display()))
        }),
        ModelSource::Memory(bytes) => builder.commit_from_memory(&bytes).map_err(|e| {
            InferError::ModelLoad(format!("failed to load model from memory: {e}"))
        }),
    }
}

/// Run a single-input, single-output model on a `[1, 3, size, size]` tensor.
///
/// Returns the first output's shape and values.
fn run_nchw(
    session: &mut Session,
    size: usize,
    nchw: Vec<f32>,
) -> Result<(Vec<usize>, Vec<f32>), InferError> {
    let array = Array4::from_shape_vec((1, 3, size, size), nchw)
        .map_err(|e| InferError::Shape(format!("failed to build input tensor: {e}")))?;
    let tensor = TensorRef::from_array_view(array.view())
        .map_err(|e| InferError::Backend(format!("failed to create tensor ref: {e}")))?;

    let outputs = session
        .run(inputs![tensor])
        .map_err(|e| InferError::Backend(format!("inference failed: {e}")))?;

    let output = outputs[0]
        .try_extract_array::<f32>()
        .map_err(|e| InferError::Backend(format!("output is not f32: {e}")))?;

    Ok((output.shape().to_vec(), output.iter().copied().collect()))
}

/// Bring `image` to `size` x `size` for the model, returning the image
/// to feed and the model-to-image scale per axis.
fn fit_to_model(
    image: &ImageBuffer,
    size: u32,
    allocator: &Allocator,
) -> Result<(Option<ImageBuffer>, Vec2<f32>), InferError> {
    let scale = Vec2::new(
        image.width() as f32 / size as f32,
        image.height() as f32 / size as f32,
    );
    if image.width() == size && image.height() == size {
        return Ok((None, scale));
    }
    let full = CropRect::new(0, 0, image.width(), image.height());
    let resized = resize_region(image, full, size, size, allocator)?;
    Ok((Some(resized), scale))
}

/// Hand detector for single-class YOLO-style models.
///
/// Expects a `[1, 3, S, S]` input in [0, 1] and a `[1, 5 + 3K, N]` output;
/// see [`decode_hand_output`].
pub struct OnnxHandDetector {
    session: Session,
    allocator: Allocator,
    input_size: u32,
    conf_threshold: f32,
    iou_threshold: f32,
}

impl OnnxHandDetector {
    /// Load the model. Defaults: 224 px input, confidence 0.5, NMS IoU 0.45.
    pub fn new(model: ModelSource, allocator: Allocator) -> Result<Self, InferError> {
        Ok(Self {
            session: load_session(model)?,
            allocator,
            input_size: 224,
            conf_threshold: 0.5,
            iou_threshold: 0.45,
        })
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    pub fn with_thresholds(mut self, conf: f32, iou: f32) -> Self {
        self.conf_threshold = conf;
        self.iou_threshold = iou;
        self
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}

impl Detector for OnnxHandDetector {
    async fn detect(&mut self, image: &ImageBuffer) -> Result<Vec<Detection>, InferError> {
        let (resized, scale) = fit_to_model(image, self.input_size, &self.allocator)?;
        let nchw = to_nchw(resized.as_ref().unwrap_or(image))?;
        drop(resized);

        let (shape, data) = run_nchw(&mut self.session, self.input_size as usize, nchw)?;
        let detections = decode_hand_output(
            &data,
            &shape,
            scale,
            self.conf_threshold,
            self.iou_threshold,
        )?;
        log::debug!("{} hand candidates after NMS", detections.len());
        Ok(detections)
    }
}

/// Gesture classifier run once per detected hand.
///
/// Each hand box is cut out of the frame and resized to the model input;
/// the model's `[1, C]` logits go through softmax and the top class becomes
/// the gesture.
pub struct OnnxGestureClassifier {
    session: Session,
    allocator: Allocator,
    labels: Vec<String>,
    input_size: u32,
    min_score: f32,
}

impl OnnxGestureClassifier {
    /// Load the model. Defaults: 224 px input, no score filtering.
    pub fn new(
        model: ModelSource,
        labels: Vec<String>,
        allocator: Allocator,
    ) -> Result<Self, InferError> {
        Ok(Self {
            session: load_session(model)?,
            allocator,
            labels,
            input_size: 224,
            min_score: 0.0,
        })
    }

    /// Read one label per non-empty line.
    pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>, InferError> {
        let text = std::fs::read_to_string(path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    /// Drop gestures scoring below `min_score`.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Pixel rectangle covering `detection`'s box, rounded outward.
fn hand_region(detection: &Detection) -> CropRect {
    let min = detection.bbox.origin;
    let max = detection.bbox.max();
    let x0 = min.x.floor().max(0.0) as u32;
    let y0 = min.y.floor().max(0.0) as u32;
    let x1 = max.x.ceil().max(0.0) as u32;
    let y1 = max.y.ceil().max(0.0) as u32;
    CropRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
}

/// Cut the hand under `detection` out of `image`, resized to `size` x `size`.
///
/// `Ok(None)` when the box lies entirely outside the image. Any other
/// failure, such as both pools being full, is an error.
fn crop_hand(
    image: &ImageBuffer,
    detection: &Detection,
    size: u32,
    allocator: &Allocator,
) -> Result<Option<ImageBuffer>, InferError> {
    let region = hand_region(detection).clamp_to(image.width(), image.height());
    if region.is_empty() {
        log::debug!("skipping hand outside the image at {:?}", detection.bbox);
        return Ok(None);
    }
    Ok(Some(resize_region(image, region, size, size, allocator)?))
}

/// Top-1 gesture from classifier logits, `None` if it scores below `min_score`.
///
/// Classes without a label are named `class_<index>`.
fn top_gesture(logits: &[f32], labels: &[String], min_score: f32) -> Option<Gesture> {
    let (index, score) = softmax(logits)
        .into_iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))?;
    if score < min_score {
        return None;
    }
    let category = labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("class_{index}"));
    Some(Gesture::new(category, score))
}

impl Classifier for OnnxGestureClassifier {
    async fn classify(
        &mut self,
        image: &ImageBuffer,
        detections: &[Detection],
    ) -> Result<Vec<Gesture>, InferError> {
        let size = self.input_size;
        let mut gestures = Vec::with_capacity(detections.len());

        for detection in detections {
            let Some(crop) = crop_hand(image, detection, size, &self.allocator)? else {
                continue;
            };
            let nchw = to_nchw(&crop)?;
            drop(crop);

            let (shape, logits) = run_nchw(&mut self.session, size as usize, nchw)?;
            if logits.is_empty() {
                return Err(InferError::Shape(format!(
                    "classifier produced an empty output {shape:?}"
                )));
            }

            if let Some(gesture) = top_gesture(&logits, &self.labels, self.min_score) {
                gestures.push(gesture);
            }
        }

        Ok(gestures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palm_base::{Rect, Vec2};
    use palm_image::{ImageError, PixelFormat};

    fn hand(x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(Rect::new(Vec2::new(x, y), Vec2::new(w, h)), 0.9)
    }

    fn frame(width: u32, height: u32) -> ImageBuffer {
        let len = (width * height * 3) as usize;
        ImageBuffer::from_vec(width, height, PixelFormat::Rgb888, vec![0; len]).unwrap()
    }

    #[test]
    fn test_hand_region_rounds_outward() {
        let region = hand_region(&hand(10.4, 20.6, 5.2, 3.1));
        // x 10.4..15.6 -> 10..16, y 20.6..23.7 -> 20..24
        assert_eq!(region, CropRect::new(10, 20, 6, 4));
    }

    #[test]
    fn test_hand_region_clamps_negative_origin() {
        let region = hand_region(&hand(-7.5, -2.0, 20.0, 10.0));
        assert_eq!(region, CropRect::new(0, 0, 13, 8));
    }

    #[test]
    fn test_crop_hand_outside_image_is_skipped() {
        let allocator = Allocator::default();
        let image = frame(32, 32);

        let right = crop_hand(&image, &hand(40.0, 5.0, 8.0, 8.0), 16, &allocator).unwrap();
        assert!(right.is_none());

        let left = crop_hand(&image, &hand(-20.0, 5.0, 10.0, 8.0), 16, &allocator).unwrap();
        assert!(left.is_none());
        assert_eq!(allocator.live(), 0);
    }

    #[test]
    fn test_crop_hand_resizes_to_model_input() {
        let allocator = Allocator::default();
        let crop = crop_hand(&frame(64, 48), &hand(4.0, 4.0, 20.0, 30.0), 16, &allocator)
            .unwrap()
            .unwrap();
        assert_eq!((crop.width(), crop.height()), (16, 16));
    }

    #[test]
    fn test_crop_hand_alloc_failure_is_an_error() {
        let allocator = Allocator::new(0, 0);
        let result = crop_hand(&frame(32, 32), &hand(4.0, 4.0, 8.0, 8.0), 16, &allocator);
        assert!(matches!(
            result,
            Err(InferError::Image(ImageError::Alloc { bytes: 768 }))
        ));
    }

    #[test]
    fn test_top_gesture_uses_label() {
        let labels = vec!["Fist".to_string(), "Open_Palm".to_string()];
        let gesture = top_gesture(&[0.1, 3.0], &labels, 0.0).unwrap();
        assert_eq!(gesture.category, "Open_Palm");
        assert!(gesture.score > 0.9);
    }

    #[test]
    fn test_top_gesture_falls_back_to_class_index() {
        let labels = vec!["Fist".to_string()];
        let gesture = top_gesture(&[0.0, 0.0, 5.0], &labels, 0.0).unwrap();
        assert_eq!(gesture.category, "class_2");
    }

    #[test]
    fn test_top_gesture_below_min_score() {
        // uniform over four classes: 0.25 each
        assert!(top_gesture(&[1.0; 4], &[], 0.3).is_none());
        assert!(top_gesture(&[1.0; 4], &[], 0.25).is_some());
    }

    #[test]
    fn test_load_labels_trims_and_skips_blank_lines() {
        let path = std::env::temp_dir()
            .join(format!("palm-labels-test-{}.txt", std::process::id()));
        std::fs::write(&path, "  Fist \n\n\tOpen_Palm\n   \nThumb_Up").unwrap();

        let labels = OnnxGestureClassifier::load_labels(&path).unwrap();
        assert_eq!(labels, vec!["Fist", "Open_Palm", "Thumb_Up"]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_labels_missing_file() {
        let result = OnnxGestureClassifier::load_labels("/nonexistent/palm/labels.txt");
        assert!(matches!(result, Err(InferError::ModelLoad(_))));
    }
}
