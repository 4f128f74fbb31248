use crate::{CameraError, CompressedFrame, FrameSlots, FrameSource};
use std::path::{Path, PathBuf};

/// Replays the JPEG files of a directory as a camera stream.
///
/// Files ending in `.jpg` or `.jpeg` (any case) are served in name order,
/// wrapping around after the last one.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    slots: FrameSlots,
}

impl DirectorySource {
    /// Scan `dir` for JPEG files.
    ///
    /// # Errors
    ///
    /// Returns `CameraError::Device` if the directory cannot be read or holds
    /// no JPEG files.
    pub fn new(dir: impl Into<PathBuf>, buffer_count: usize) -> Result<Self, CameraError> {
        let dir = dir.into();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && is_jpeg(&path) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(CameraError::Device(format!(
                "no JPEG files in {}",
                dir.display()
            )));
        }
        log::debug!("{} frames found in {}", files.len(), dir.display());

        Ok(Self {
            dir,
            files,
            next: 0,
            slots: FrameSlots::new(buffer_count),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files in the rotation.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Frames checked out and not yet released.
    pub fn outstanding(&self) -> usize {
        self.slots.outstanding()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
}

impl FrameSource for DirectorySource {
    async fn acquire(&mut self) -> Result<CompressedFrame, CameraError> {
        self.slots.ensure_free()?;

        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| CameraError::Stream(format!("{}: {e}", path.display())))?;

        let sequence = self.slots.check_out()?;
        Ok(CompressedFrame::new(data, sequence))
    }

    fn release(&mut self, frame: CompressedFrame) {
        drop(frame);
        self.slots.check_in();
    }
}
