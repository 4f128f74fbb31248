use std::fmt;

#[derive(Debug)]
pub enum InferError {
    Shape(String),
    ModelLoad(String),
    Backend(String),
    Image(palm_image::ImageError),
}

impl fmt::Display for InferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferError::Shape(msg) => write!(f, "shape error: {msg}"),
            InferError::ModelLoad(msg) => write!(f, "model load error: {msg}"),
            InferError::Backend(msg) => write!(f, "backend error: {msg}"),
            InferError::Image(err) => write!(f, "image error: {err}"),
        }
    }
}

impl std::error::Error for InferError {}

impl From<palm_image::ImageError> for InferError {
    fn from(err: palm_image::ImageError) -> Self {
        InferError::Image(err)
    }
}

impl From<std::io::Error> for InferError {
    fn from(err: std::io::Error) -> Self {
        InferError::ModelLoad(err.to_string())
    }
}
