use crate::CameraError;

/// Bookkeeping for a fixed number of frame buffers.
#[derive(Debug, Clone)]
pub struct FrameSlots {
    capacity: usize,
    outstanding: usize,
    next_sequence: u64,
}

impl FrameSlots {
    /// `capacity` is clamped to at least one slot.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            outstanding: 0,
            next_sequence: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames currently checked out.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Fail with `Busy` if every slot is checked out.
    pub fn ensure_free(&self) -> Result<(), CameraError> {
        if self.outstanding >= self.capacity {
            return Err(CameraError::Busy {
                slots: self.capacity,
            });
        }
        Ok(())
    }

    /// Mark one slot as checked out and return the frame's sequence number.
    pub fn check_out(&mut self) -> Result<u64, CameraError> {
        self.ensure_free()?;
        self.outstanding += 1;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Ok(sequence)
    }

    pub fn check_in(&mut self) {
        if self.outstanding == 0 {
            log::warn!("frame released with no frames checked out");
            return;
        }
        self.outstanding -= 1;
    }
}
