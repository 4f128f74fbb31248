pub mod cancel;
pub mod logging;
pub mod pool;
pub mod rect;
pub mod vec2;

pub use cancel::CancelToken;
pub use logging::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};
pub use pool::{Allocator, Pool, PoolBuffer};
pub use rect::Rect;
pub use vec2::Vec2;

// Re-export log crate so downstream crates can use palm_base::log::*
pub use log;
