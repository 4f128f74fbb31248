use crate::PipelineConfig;
use palm_base::{Allocator, CancelToken};
use palm_camera::FrameSource;
use palm_image::{Decoder, PixelFormat, resample};
use palm_infer::{Classifier, Detector, Gesture};
use std::time::Duration;

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The source had no frame to give.
    NoFrame,
    DecodeFailed,
    /// Cropping or resizing failed, usually because both pools were full.
    ResampleFailed,
    DetectFailed,
    /// The detector ran but found no hands.
    NoHand,
    ClassifyFailed,
    /// Hands were classified; one entry per gesture, possibly none.
    Recognized(Vec<Gesture>),
}

impl Step {
    /// How long the loop waits before the next frame.
    pub fn pace(&self, config: &PipelineConfig) -> Duration {
        match self {
            Step::NoHand => config.idle_delay(),
            Step::Recognized(_) => config.cycle_delay(),
            Step::NoFrame
            | Step::DecodeFailed
            | Step::ResampleFailed
            | Step::DetectFailed
            | Step::ClassifyFailed => config.retry_delay(),
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Step::NoHand | Step::Recognized(_))
    }
}

/// The capture, decode, resample, detect and classify loop.
///
/// Every buffer a step allocates is dropped before the step returns, and
/// every frame acquired from the source is released right after decoding.
pub struct Pipeline<S, Dec, D, C> {
    source: S,
    decoder: Dec,
    detector: D,
    classifier: C,
    allocator: Allocator,
    config: PipelineConfig,
    frame: u64,
}

impl<S, Dec, D, C> Pipeline<S, Dec, D, C>
where
    S: FrameSource,
    Dec: Decoder,
    D: Detector,
    C: Classifier,
{
    pub fn new(
        source: S,
        decoder: Dec,
        detector: D,
        classifier: C,
        allocator: Allocator,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            decoder,
            detector,
            classifier,
            allocator,
            config,
            frame: 0,
        }
    }

    /// Number of the most recent frame; 0 before the first step.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Pull and discard a few frames so the sensor can settle its exposure.
    ///
    /// Failures are ignored and the frame counter is left alone.
    pub async fn warm_up(&mut self) {
        let frames = self.config.warmup_frames();
        for i in 0..frames {
            match self.source.acquire().await {
                Ok(frame) => self.source.release(frame),
                Err(e) => log::debug!("warm-up frame {} of {frames} failed: {e}", i + 1),
            }
            tokio::time::sleep(self.config.warmup_delay()).await;
        }
        if frames > 0 {
            log::debug!("discarded {frames} warm-up frames");
        }
    }

    /// Process one frame and report the outcome. Does not sleep.
    pub async fn step(&mut self) -> Step {
        self.frame += 1;
        let frame = self.frame;

        let compressed = match self.source.acquire().await {
            Ok(compressed) => compressed,
            Err(e) => {
                log::error!("[{frame}] Frame capture failed: {e}");
                return Step::NoFrame;
            }
        };

        let decoded = self.decoder.decode(compressed.data(), PixelFormat::Rgb888);
        self.source.release(compressed);
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => {
                log::error!("[{frame}] JPEG decode failed: {e}");
                return Step::DecodeFailed;
            }
        };

        let resized = resample(&decoded, self.config.target_size(), &self.allocator);
        drop(decoded);
        let resized = match resized {
            Ok(resized) => resized,
            Err(e) => {
                log::error!("[{frame}] Resize failed: {e}");
                return Step::ResampleFailed;
            }
        };

        let hands = match self.detector.detect(&resized).await {
            Ok(hands) => hands,
            Err(e) => {
                log::error!("[{frame}] Hand detection failed: {e}");
                return Step::DetectFailed;
            }
        };
        if hands.is_empty() {
            log::warn!("[{frame}] No hand detected");
            return Step::NoHand;
        }
        log::debug!("[{frame}] {} hand(s) detected", hands.len());

        let gestures = match self.classifier.classify(&resized, &hands).await {
            Ok(gestures) => gestures,
            Err(e) => {
                log::error!("[{frame}] Gesture classification failed: {e}");
                return Step::ClassifyFailed;
            }
        };

        for gesture in &gestures {
            log::info!(
                "[{frame}] Gesture: {} score={:.2}",
                gesture.category,
                gesture.score
            );
        }

        Step::Recognized(gestures)
    }

    /// Step and pace until `cancel` fires.
    ///
    /// Cancellation is checked before each frame and interrupts the pacing
    /// sleep; a step already in progress runs to completion.
    pub async fn run(&mut self, cancel: &CancelToken) {
        log::info!(
            "gesture loop started, {}x{} input",
            self.config.target_size(),
            self.config.target_size()
        );

        while !cancel.is_cancelled() {
            let step = self.step().await;
            let delay = step.pace(&self.config);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => break,
            }
        }

        log::info!("gesture loop stopped after {} frames", self.frame);
    }
}
