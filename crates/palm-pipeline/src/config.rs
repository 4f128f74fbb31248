use std::time::Duration;

/// Timing and geometry of the recognition loop.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    target_size: u32,
    retry_delay: Duration,
    idle_delay: Duration,
    cycle_delay: Duration,
    warmup_frames: usize,
    warmup_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: 224,
            retry_delay: Duration::from_millis(100),
            idle_delay: Duration::from_millis(300),
            cycle_delay: Duration::from_millis(2000),
            warmup_frames: 5,
            warmup_delay: Duration::from_millis(50),
        }
    }
}

impl PipelineConfig {
    /// Side length of the square image handed to the detector.
    pub fn with_target_size(mut self, target_size: u32) -> Self {
        self.target_size = target_size;
        self
    }

    /// Pause after a failed acquire, decode, resample or inference.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Pause after a frame with no hand in it.
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Pause after a fully processed frame.
    pub fn with_cycle_delay(mut self, delay: Duration) -> Self {
        self.cycle_delay = delay;
        self
    }

    /// Frames thrown away at startup while exposure settles.
    pub fn with_warmup_frames(mut self, frames: usize) -> Self {
        self.warmup_frames = frames;
        self
    }

    pub fn with_warmup_delay(mut self, delay: Duration) -> Self {
        self.warmup_delay = delay;
        self
    }

    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn idle_delay(&self) -> Duration {
        self.idle_delay
    }

    pub fn cycle_delay(&self) -> Duration {
        self.cycle_delay
    }

    pub fn warmup_frames(&self) -> usize {
        self.warmup_frames
    }

    pub fn warmup_delay(&self) -> Duration {
        self.warmup_delay
    }
}
