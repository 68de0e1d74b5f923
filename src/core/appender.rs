//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// Sink receiving fully merged log entries
///
/// Errors returned here never reach the code that logged the entry; the
/// logger reports them on stderr and counts them in its metrics.
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}

impl<A: Appender + ?Sized> Appender for Box<A> {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        (**self).append(entry)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
