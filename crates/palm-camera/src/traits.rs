use crate::{CameraError, CompressedFrame};

/// A supplier of compressed frames.
///
/// `acquire` checks a frame out; the caller must pass it back to `release`
/// when done, on success and failure paths alike, or the source will
/// eventually run out of slots and report `CameraError::Busy`.
#[allow(async_fn_in_trait)]
pub trait FrameSource {
    /// Wait for and check out the next frame.
    async fn acquire(&mut self) -> Result<CompressedFrame, CameraError>;

    /// Return a frame to the source. Best effort; never fails.
    fn release(&mut self, frame: CompressedFrame);
}
