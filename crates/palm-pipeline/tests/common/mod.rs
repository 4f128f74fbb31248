#![allow(dead_code)]

use crates_image::ImageEncoder;
use palm_base::{Allocator, Rect, Vec2};
use palm_camera::{CameraError, CompressedFrame, FrameSource};
use palm_image::{ImageBuffer, JpegDecoder};
use palm_infer::{Classifier, Detection, Detector, Gesture, InferError};
use palm_pipeline::{Pipeline, PipelineConfig};

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = crates_image::RgbImage::from_fn(width, height, |x, y| {
        crates_image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buffer = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, crates_image::ExtendedColorType::Rgb8)
        .unwrap();
    buffer
}

/// Serves `frames` in a loop; `None` entries fail the acquire.
pub struct ScriptedSource {
    frames: Vec<Option<Vec<u8>>>,
    next: usize,
    pub acquired: usize,
    pub released: usize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Option<Vec<u8>>>) -> Self {
        Self {
            frames,
            next: 0,
            acquired: 0,
            released: 0,
        }
    }

    pub fn outstanding(&self) -> usize {
        self.acquired - self.released
    }
}

impl FrameSource for ScriptedSource {
    async fn acquire(&mut self) -> Result<CompressedFrame, CameraError> {
        let index = self.next % self.frames.len();
        self.next += 1;
        match &self.frames[index] {
            Some(data) => {
                self.acquired += 1;
                Ok(CompressedFrame::new(data.clone(), self.next as u64))
            }
            None => Err(CameraError::Stream("no frame".to_string())),
        }
    }

    fn release(&mut self, _frame: CompressedFrame) {
        self.released += 1;
    }
}

/// Returns `script[call]`, repeating the last entry; `None` is a backend error.
pub struct ScriptedDetector {
    script: Vec<Option<Vec<Detection>>>,
    pub calls: usize,
    pub last_size: Option<(u32, u32)>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Option<Vec<Detection>>>) -> Self {
        Self {
            script,
            calls: 0,
            last_size: None,
        }
    }

    pub fn always(hands: Vec<Detection>) -> Self {
        Self::new(vec![Some(hands)])
    }

    pub fn failing() -> Self {
        Self::new(vec![None])
    }
}

impl Detector for ScriptedDetector {
    async fn detect(&mut self, image: &ImageBuffer) -> Result<Vec<Detection>, InferError> {
        let index = self.calls.min(self.script.len() - 1);
        self.calls += 1;
        self.last_size = Some((image.width(), image.height()));
        self.script[index]
            .clone()
            .ok_or_else(|| InferError::Backend("detector exploded".to_string()))
    }
}

pub struct FixedClassifier {
    gestures: Option<Vec<Gesture>>,
    pub calls: usize,
    pub last_hands: usize,
}

impl FixedClassifier {
    pub fn new(gestures: Vec<Gesture>) -> Self {
        Self {
            gestures: Some(gestures),
            calls: 0,
            last_hands: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            gestures: None,
            calls: 0,
            last_hands: 0,
        }
    }
}

impl Classifier for FixedClassifier {
    async fn classify(
        &mut self,
        _image: &ImageBuffer,
        detections: &[Detection],
    ) -> Result<Vec<Gesture>, InferError> {
        self.calls += 1;
        self.last_hands = detections.len();
        self.gestures
            .clone()
            .ok_or_else(|| InferError::Shape("classifier exploded".to_string()))
    }
}

pub fn hand() -> Detection {
    Detection::new(Rect::new(Vec2::new(60.0, 40.0), Vec2::new(80.0, 100.0)), 0.88)
}

pub fn open_palm_and_fist() -> Vec<Gesture> {
    vec![Gesture::new("Open_Palm", 0.92), Gesture::new("Fist", 0.05)]
}

pub type TestPipeline = Pipeline<ScriptedSource, JpegDecoder, ScriptedDetector, FixedClassifier>;

pub fn pipeline(
    frames: Vec<Option<Vec<u8>>>,
    detector: ScriptedDetector,
    classifier: FixedClassifier,
    allocator: Allocator,
) -> TestPipeline {
    Pipeline::new(
        ScriptedSource::new(frames),
        JpegDecoder::new(allocator.clone()),
        detector,
        classifier,
        allocator,
        PipelineConfig::default(),
    )
}
