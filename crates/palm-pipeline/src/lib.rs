//! The acquire, decode, resample, detect, classify and report loop.

pub mod config;
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::{Pipeline, Step};
