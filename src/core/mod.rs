//! Core logger types and traits

pub mod appender;
pub mod enricher;
pub mod error;
pub mod error_bridge;
pub mod fault;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;

pub use appender::Appender;
pub use enricher::{ContextEnricher, ExceptionSerializer, MAX_FAULT_CHAIN_DEPTH};
pub use error::{LoggerError, Result};
pub use error_bridge::{ErrorBridge, FaultClass, PolicyAction, PolicyTable};
pub use fault::Fault;
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{BufferedLogger, LoggerBuilder, SharedLogger, REQUEST_SUMMARY_MESSAGE};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
