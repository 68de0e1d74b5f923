//! Appender that discards everything

use crate::core::{Appender, LogEntry, Result};

/// Blackhole sink
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAppender;

impl NullAppender {
    pub fn new() -> Self {
        Self
    }
}

impl Appender for NullAppender {
    fn append(&mut self, _entry: &LogEntry) -> Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
