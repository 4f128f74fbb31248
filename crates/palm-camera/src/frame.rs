/// One compressed (JPEG) frame checked out of a [`FrameSource`](crate::FrameSource).
///
/// Hand it back with `FrameSource::release` once the bytes have been decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFrame {
    data: Vec<u8>,
    sequence: u64,
}

impl CompressedFrame {
    pub fn new(data: Vec<u8>, sequence: u64) -> Self {
        Self { data, sequence }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of this frame in the source's own capture order.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Take back the byte buffer, e.g. to reuse its allocation.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
