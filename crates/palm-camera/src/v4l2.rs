use crate::{CameraConfig, CameraError, CompressedFrame, FrameSlots, FrameSource};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

type FrameResult = Result<Vec<u8>, CameraError>;

/// MJPEG frame source for V4L2 devices.
///
/// Capture runs on a background thread that copies each driver buffer into
/// a byte vector and hands it over a bounded channel. Released frames send
/// their vectors back to the thread for reuse.
pub struct V4l2Source {
    config: CameraConfig,
    device: Option<Device>,
    receiver: Option<mpsc::Receiver<FrameResult>>,
    recycle: Option<std_mpsc::Sender<Vec<u8>>>,
    thread_handle: Option<JoinHandle<()>>,
    slots: FrameSlots,
}

impl std::fmt::Debug for V4l2Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Source")
            .field("config", &self.config)
            .field("device", &"<v4l::Device>")
            .field("receiver", &self.receiver.is_some())
            .field("thread_handle", &self.thread_handle.is_some())
            .field("slots", &self.slots)
            .finish()
    }
}

impl FrameSource for V4l2Source {
    async fn acquire(&mut self) -> Result<CompressedFrame, CameraError> {
        self.slots.ensure_free()?;
        self.ensure_started()?;

        let receiver = self
            .receiver
            .as_mut()
            .ok_or_else(|| CameraError::Channel("Receiver not initialized".to_string()))?;

        let data = receiver
            .recv()
            .await
            .ok_or_else(|| CameraError::Channel("Capture thread terminated".to_string()))??;

        let sequence = self.slots.check_out()?;
        Ok(CompressedFrame::new(data, sequence))
    }

    fn release(&mut self, frame: CompressedFrame) {
        self.slots.check_in();
        if let Some(recycle) = &self.recycle {
            // the capture thread may already be gone; then the buffer is just dropped
            let _ = recycle.send(frame.into_data());
        }
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        // Dropping the receiver makes the next blocking_send fail, which ends the thread
        drop(self.receiver.take());
        drop(self.recycle.take());

        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl V4l2Source {
    /// Open the device at `config.device()` for MJPEG capture.
    ///
    /// # Errors
    ///
    /// Returns `CameraError::Device` if the device cannot be opened, does not
    /// support MJPEG at the requested resolution, or rejects the frame rate.
    pub fn new(config: CameraConfig) -> Result<Self, CameraError> {
        let device = Device::with_path(config.device())?;

        let mut format = Format::new(config.width(), config.height(), FourCC::new(b"MJPG"));
        format = Capture::set_format(&device, &format)?;

        // The driver may silently substitute another format
        if format.fourcc != FourCC::new(b"MJPG") {
            return Err(CameraError::Device(
                "MJPEG format not supported by device".to_string(),
            ));
        }
        if format.width != config.width() || format.height != config.height() {
            log::warn!(
                "requested {}x{}, device delivers {}x{}",
                config.width(),
                config.height(),
                format.width,
                format.height
            );
        }

        let params = v4l::video::capture::Parameters::with_fps(config.fps());
        Capture::set_params(&device, &params)?;

        let slots = FrameSlots::new(config.buffer_count() as usize);
        Ok(Self {
            config,
            device: Some(device),
            receiver: None,
            recycle: None,
            thread_handle: None,
            slots,
        })
    }

    /// Start the capture thread on the first `acquire()`.
    fn ensure_started(&mut self) -> Result<(), CameraError> {
        if self.receiver.is_some() {
            return Ok(());
        }

        let device = self
            .device
            .take()
            .ok_or_else(|| CameraError::Device("Device already consumed".to_string()))?;

        let buffer_count = self.config.buffer_count().max(1);
        let (tx, rx) = mpsc::channel(buffer_count as usize);
        let (recycle_tx, recycle_rx) = std_mpsc::channel();

        let handle = thread::spawn(move || {
            if let Err(e) = Self::capture_loop(device, tx, recycle_rx, buffer_count) {
                log::error!("capture thread stopped: {e}");
            }
        });

        self.receiver = Some(rx);
        self.recycle = Some(recycle_tx);
        self.thread_handle = Some(handle);

        Ok(())
    }

    /// Copy MJPEG frames out of the driver's mmap buffers and send them on.
    fn capture_loop(
        device: Device,
        tx: mpsc::Sender<FrameResult>,
        recycle: std_mpsc::Receiver<Vec<u8>>,
        buffer_count: u32,
    ) -> Result<(), CameraError> {
        let mut stream = MmapStream::with_buffers(&device, Type::VideoCapture, buffer_count)?;

        loop {
            let (frame_data, metadata) = CaptureStream::next(&mut stream)?;
            let used = (metadata.bytesused as usize).min(frame_data.len());

            // The mmap buffer is only valid until the next call
            let mut data = recycle.try_recv().unwrap_or_default();
            data.clear();
            data.extend_from_slice(&frame_data[..used]);

            if tx.blocking_send(Ok(data)).is_err() {
                break;
            }
        }

        Ok(())
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}
