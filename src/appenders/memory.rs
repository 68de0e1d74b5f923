//! In-memory appender
//!
//! Keeps every delivered entry for later inspection. Clones share the same
//! storage, so a test can hand one clone to the logger and keep the other.

use crate::core::{Appender, LogEntry, LogLevel, Result};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryAppender {
    records: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of delivered entries in delivery order
    pub fn records(&self) -> Vec<LogEntry> {
        self.records.lock().clone()
    }

    /// Raw messages of delivered entries
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    pub fn has_record(&self, level: LogLevel, message: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|entry| entry.level == level && entry.message == message)
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Appender for MemoryAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.records.lock().push(entry.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
