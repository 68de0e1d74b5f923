//! # Request Logger
//!
//! Request-scoped logging for multi-tenant HTTP and CLI services.
//!
//! Entries logged before the current request is identified are buffered;
//! once a session id and a request id are known the buffer is drained and
//! every entry carries the application environment and both correlation ids.
//!
//! ## Features
//!
//! - **Buffering**: nothing reaches a sink until the request is correlated or a flush is forced
//! - **Context enrichment**: faults become flat `key_class`/`key_trace` fields; long strings are chunked
//! - **Error bridge**: panics are routed through the logger with a per-class policy table
//! - **Sinks**: daily rotating files, GELF over UDP, a queued worker thread, null and memory
//! - **Configuration**: loggers built from TOML with [`factory::LoggerFactory`]
//!
//! ## Example
//!
//! ```
//! use request_logger::prelude::*;
//! use request_logger::appenders::MemoryAppender;
//! use http::{Method, Uri};
//!
//! let records = MemoryAppender::new();
//! let mut logger = BufferedLogger::builder()
//!     .app_env(AppEnv::new("Tracker", "1.0.0", "production"))
//!     .appender(records.clone())
//!     .build();
//!
//! logger.info("Booting", LogContext::new());
//! assert!(records.is_empty());
//!
//! let uri: Uri = "/projects?page=2".parse().unwrap();
//! logger.set_app_request(HttpRequest::new(&Method::GET, &uri).with_correlation("s-1", "r-1"));
//!
//! let dispatched = records.records();
//! let entry = &dispatched[0];
//! assert_eq!(entry.context.get("request_id").and_then(|v| v.as_str()), Some("r-1"));
//! ```

pub mod appenders;
pub mod core;
pub mod descriptors;
pub mod facade;
pub mod factory;
pub mod macros;

pub mod prelude {
    pub use crate::appenders::{MemoryAppender, NullAppender, RotatingFileAppender};
    pub use crate::core::{
        Appender, BufferedLogger, ErrorBridge, Fault, FaultClass, FieldValue, LogContext,
        LogEntry, LogLevel, LoggerBuilder, LoggerError, LoggerMetrics, OutputFormat,
        PolicyAction, Result, SharedLogger,
    };
    pub use crate::descriptors::{
        AppEnv, CliRequest, CommandLayout, EnvironmentDescriptor, HttpRequest, HttpResponse,
        RequestDescriptor, ResponseDescriptor,
    };
    pub use crate::factory::{LoggerConfig, LoggerFactory, SinkConfig};
}

pub use appenders::{GelfAppender, MemoryAppender, NullAppender, QueuedAppender, RotatingFileAppender};
pub use core::{
    Appender, BufferedLogger, ContextEnricher, ErrorBridge, ExceptionSerializer, Fault, FaultClass,
    FieldValue, LogContext, LogEntry, LogLevel, LoggerBuilder, LoggerError, LoggerMetrics,
    OutputFormat, PolicyAction, PolicyTable, Result, SharedLogger, REQUEST_SUMMARY_MESSAGE,
};
pub use descriptors::{AppEnv, CliRequest, CommandLayout, HttpRequest, HttpResponse};
pub use facade::LogFacade;
pub use factory::{LoggerConfig, LoggerFactory, SinkConfig};
