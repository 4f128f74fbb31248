use palm_base::{Allocator, CancelToken, init_stdout_logger, log_fatal};
use palm_image::JpegDecoder;
use palm_infer::{ModelSource, OnnxGestureClassifier, OnnxHandDetector};
use palm_pipeline::{Pipeline, PipelineConfig};

#[cfg(not(feature = "v4l2"))]
const FRAMES_DIR: &str = "frames";
#[cfg(feature = "v4l2")]
const DEVICE: &str = "/dev/video0";
const FRAME_BUFFERS: u32 = 1;

const DETECTOR_MODEL: &str = "models/hand_detector.onnx";
const CLASSIFIER_MODEL: &str = "models/gesture_classifier.onnx";
const LABELS: &str = "models/gesture_labels.txt";

// fast pool sized for one decoded VGA frame, general pool for everything else
const FAST_POOL_BYTES: usize = 640 * 480 * 3;
const GENERAL_POOL_BYTES: usize = 8 * 1024 * 1024;

const TARGET_SIZE: u32 = 224;
const MIN_GESTURE_SCORE: f32 = 0.0;

#[cfg(not(feature = "v4l2"))]
fn open_source() -> palm_camera::DirectorySource {
    match palm_camera::DirectorySource::new(FRAMES_DIR, FRAME_BUFFERS as usize) {
        Ok(source) => {
            log::info!("replaying {} frames from {FRAMES_DIR}", source.len());
            source
        }
        Err(e) => log_fatal!("failed to open frame directory {FRAMES_DIR}: {e}"),
    }
}

#[cfg(feature = "v4l2")]
fn open_source() -> palm_camera::V4l2Source {
    let config = palm_camera::CameraConfig::default()
        .with_device(DEVICE)
        .with_buffer_count(FRAME_BUFFERS);
    match palm_camera::V4l2Source::new(config) {
        Ok(source) => {
            log::info!("capturing from {DEVICE}");
            source
        }
        Err(e) => log_fatal!("failed to open camera {DEVICE}: {e}"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_stdout_logger();

    let allocator = Allocator::new(FAST_POOL_BYTES, GENERAL_POOL_BYTES);
    let source = open_source();

    let detector = match OnnxHandDetector::new(
        ModelSource::File(DETECTOR_MODEL.into()),
        allocator.clone(),
    ) {
        Ok(detector) => detector.with_input_size(TARGET_SIZE),
        Err(e) => log_fatal!("failed to load hand detector: {e}"),
    };

    let labels = match OnnxGestureClassifier::load_labels(LABELS) {
        Ok(labels) => labels,
        Err(e) => log_fatal!("failed to read gesture labels: {e}"),
    };
    let classifier = match OnnxGestureClassifier::new(
        ModelSource::File(CLASSIFIER_MODEL.into()),
        labels,
        allocator.clone(),
    ) {
        Ok(classifier) => classifier.with_min_score(MIN_GESTURE_SCORE),
        Err(e) => log_fatal!("failed to load gesture classifier: {e}"),
    };
    log::info!("{} gesture classes", classifier.labels().len());

    let config = PipelineConfig::default().with_target_size(TARGET_SIZE);
    let mut pipeline = Pipeline::new(
        source,
        JpegDecoder::new(allocator.clone()),
        detector,
        classifier,
        allocator,
        config,
    );

    let cancel = CancelToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupted, stopping");
            stopper.cancel();
        }
    });

    pipeline.warm_up().await;
    pipeline.run(&cancel).await;

    Ok(())
}
