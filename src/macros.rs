//! Logging macros with inline context.
//!
//! Messages are templates: `{key}` placeholders are filled from the context
//! when the entry is formatted. Context pairs follow the message after a `;`.
//!
//! # Examples
//!
//! ```
//! use request_logger::prelude::*;
//! use request_logger::{info, warning};
//!
//! let mut logger = BufferedLogger::new(AppEnv::new("Tracker", "1.0.0", "production"));
//!
//! // Message only
//! info!(logger, "Server started");
//!
//! // With context
//! let port = 8080;
//! info!(logger, "Server listening on port {port}"; "port" => port);
//! warning!(logger, "Retry {attempt} of {max}"; "attempt" => 3, "max" => 5);
//!
//! assert_eq!(logger.buffer().len(), 3);
//! ```

/// Log a message at an explicit level.
///
/// # Examples
///
/// ```
/// # use request_logger::prelude::*;
/// # let mut logger = BufferedLogger::new(AppEnv::default());
/// use request_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {code}"; "code" => 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $message:expr $(; $($key:expr => $value:expr),+ $(,)?)?) => {{
        #[allow(unused_mut)]
        let mut context = $crate::LogContext::new();
        $($(context.insert($key, $value);)+)?
        $logger.log($level, $message, context)
    }};
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Notice, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use request_logger::prelude::*;
/// # let mut logger = BufferedLogger::new(AppEnv::default());
/// use request_logger::warning;
/// warning!(logger, "Low disk space");
/// warning!(logger, "{free} MB left"; "free" => 120);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// # Examples
///
/// ```
/// # use request_logger::prelude::*;
/// # let mut logger = BufferedLogger::new(AppEnv::default());
/// use request_logger::critical;
/// let fault = Fault::new("RuntimeException", "Disk full");
/// critical!(logger, "Unable to recover"; "exception" => fault);
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Alert, $($arg)+)
    };
}

/// Log an emergency-level message.
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Emergency, $($arg)+)
    };
}
