//! Hand detection and gesture classification interfaces.
//!
//! The pipeline only talks to [`Detector`] and [`Classifier`]. With the
//! `onnx` feature, ONNX Runtime backed implementations are available.

pub mod detection;
pub mod error;
pub mod gesture;
pub mod postprocess;
pub mod preprocess;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use detection::{Detection, Detector, Keypoint};
pub use error::InferError;
pub use gesture::{Classifier, Gesture};
pub use postprocess::{decode_hand_output, non_max_suppression, softmax};
pub use preprocess::to_nchw;

#[cfg(feature = "onnx")]
pub use onnx::{ModelSource, OnnxGestureClassifier, OnnxHandDetector};
