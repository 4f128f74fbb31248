use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    Decode(String),
    /// Neither memory pool could provide `bytes`.
    Alloc { bytes: usize },
    InvalidSize(String),
    Format(String),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::Decode(msg) => write!(f, "decode error: {msg}"),
            ImageError::Alloc { bytes } => write!(f, "failed to allocate {bytes} bytes"),
            ImageError::InvalidSize(msg) => write!(f, "invalid size: {msg}"),
            ImageError::Format(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<crates_image::ImageError> for ImageError {
    fn from(err: crates_image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}
