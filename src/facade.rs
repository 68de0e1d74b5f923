//! Bridge from the `log` crate
//!
//! Installs a [`SharedLogger`] as the global `log` logger so that records
//! emitted by libraries through `log::info!` and friends are buffered and
//! correlated like any other entry.

use crate::core::{LogContext, LogLevel, LoggerError, Result, SharedLogger};
use log::{Level, LevelFilter, Metadata, Record};

/// Map a `log` level onto the logger's severity scale
pub fn map_level(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::Error,
        Level::Warn => LogLevel::Warning,
        Level::Info => LogLevel::Info,
        Level::Debug | Level::Trace => LogLevel::Debug,
    }
}

/// `log::Log` implementation writing into a [`SharedLogger`]
pub struct LogFacade {
    logger: SharedLogger,
    level: LevelFilter,
}

impl LogFacade {
    pub fn new(logger: SharedLogger, level: LevelFilter) -> Self {
        Self { logger, level }
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Register as the global `log` logger and set the max level
    ///
    /// # Errors
    ///
    /// Fails when a global logger has already been set
    pub fn install(self) -> Result<()> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| LoggerError::config("log facade", e.to_string()))?;
        log::set_max_level(level);
        Ok(())
    }

    fn record_context(record: &Record<'_>) -> LogContext {
        let mut context = LogContext::new().with_field("target", record.target());

        if let Some(module_path) = record.module_path() {
            context.insert("module_path", module_path);
        }
        if let Some(file) = record.file() {
            context.insert("file", file);
        }
        if let Some(line) = record.line() {
            context.insert("line", line);
        }

        context
    }
}

/// Install `logger` as the global `log` logger
pub fn install(logger: SharedLogger, level: LevelFilter) -> Result<()> {
    LogFacade::new(logger, level).install()
}

impl log::Log for LogFacade {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let context = Self::record_context(record);
        self.logger
            .lock()
            .log(map_level(record.level()), record.args().to_string(), context);
    }

    /// Flush the appenders, forcing out buffered entries first when the
    /// shutdown flush is armed
    ///
    /// `log` never drops its global logger; call `log::logger().flush()`
    /// before exit to run the shutdown flush.
    fn flush(&self) {
        let mut logger = self.logger.lock();

        if logger.is_shutdown_flush_armed() {
            logger.flush_buffer(true);
        }

        if let Err(e) = logger.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush log facade: {}", e);
        }
    }
}
