//! Appender implementations

pub mod gelf;
pub mod memory;
pub mod null;
pub mod queued;
pub mod rotating_file;

pub use gelf::GelfAppender;
pub use memory::MemoryAppender;
pub use null::NullAppender;
pub use queued::{QueuedAppender, DEFAULT_QUEUE_CAPACITY, DEFAULT_SHUTDOWN_TIMEOUT};
pub use rotating_file::RotatingFileAppender;

pub use crate::core::Appender;
