//! Buffered request logger
//!
//! Entries logged before a request's correlation pair (session id and
//! request id) is known are kept in a FIFO buffer. Once a request with both
//! ids is assigned, the buffer is drained to the appenders and every later
//! entry is dispatched immediately.

use super::{
    appender::Appender,
    enricher::{ContextEnricher, ExceptionSerializer},
    error::{LoggerError, Result},
    log_context::{FieldValue, LogContext},
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
};
use crate::descriptors::{
    AppEnv, EnvironmentDescriptor, RequestDescriptor, ResponseDescriptor, CLI_SAPI,
};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Handle for collaborators that share one logger
pub type SharedLogger = Arc<Mutex<BufferedLogger>>;

/// Message of the request summary event
pub const REQUEST_SUMMARY_MESSAGE: &str = "Request {signature} done in {exec_time} miliseconds";

pub struct BufferedLogger {
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
    enricher: ContextEnricher,
    metrics: LoggerMetrics,

    app_env: Arc<dyn EnvironmentDescriptor>,
    env_arguments: LogContext,

    app_request: Option<Arc<dyn RequestDescriptor>>,
    request_signature: String,
    request_summary_arguments: LogContext,
    /// `session_id` and `request_id`; non-empty once flushing
    request_arguments: LogContext,

    app_response: Option<Arc<dyn ResponseDescriptor>>,
    response_summary_arguments: LogContext,

    buffer: Vec<LogEntry>,
    flush_on_shutdown: bool,
}

impl BufferedLogger {
    #[must_use]
    pub fn new<E: EnvironmentDescriptor + 'static>(app_env: E) -> Self {
        Self::with_env(Arc::new(app_env))
    }

    fn with_env(app_env: Arc<dyn EnvironmentDescriptor>) -> Self {
        Self {
            min_level: LogLevel::Debug,
            appenders: Vec::new(),
            enricher: ContextEnricher::new(),
            metrics: LoggerMetrics::new(),
            env_arguments: app_env.arguments(),
            app_env,
            app_request: None,
            request_signature: String::new(),
            request_summary_arguments: LogContext::new(),
            request_arguments: LogContext::new(),
            app_response: None,
            response_summary_arguments: LogContext::new(),
            buffer: Vec::new(),
            flush_on_shutdown: false,
        }
    }

    /// Create a builder for BufferedLogger
    ///
    /// # Example
    /// ```
    /// use request_logger::prelude::*;
    ///
    /// let logger = BufferedLogger::builder()
    ///     .app_env(AppEnv::new("Tracker", "1.0.0", "production"))
    ///     .min_level(LogLevel::Info)
    ///     .appender(NullAppender::new())
    ///     .build();
    ///
    /// assert!(!logger.is_flushing());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Wrap the logger in a [`SharedLogger`] handle
    pub fn into_shared(self) -> SharedLogger {
        Arc::new(Mutex::new(self))
    }

    pub fn add_appender(&mut self, appender: Box<dyn Appender>) {
        self.appenders.push(appender);
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Set the minimum level that reaches the appenders
    ///
    /// Filtering happens at dispatch; entries below the level are still
    /// buffered until the flush decides their fate.
    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn chunk_size(&self) -> usize {
        self.enricher.chunk_size()
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.enricher.set_chunk_size(chunk_size);
    }

    pub fn add_exception_serializer(&mut self, serializer: ExceptionSerializer) {
        self.enricher.add_serializer(serializer);
    }

    pub fn exception_serializers(&self) -> &[ExceptionSerializer] {
        self.enricher.serializers()
    }

    pub fn app_env(&self) -> &dyn EnvironmentDescriptor {
        self.app_env.as_ref()
    }

    pub fn set_app_env<E: EnvironmentDescriptor + 'static>(&mut self, app_env: E) {
        self.env_arguments = app_env.arguments();
        self.app_env = Arc::new(app_env);
    }

    pub fn app_request(&self) -> Option<&dyn RequestDescriptor> {
        self.app_request.as_deref()
    }

    /// Assign the request being served
    ///
    /// When the request carries both a session id and a request id the
    /// logger switches to flushing and drains the buffer. A request with a
    /// missing id refreshes the summary arguments only; it never takes the
    /// logger back to buffering.
    pub fn set_app_request<R: RequestDescriptor + 'static>(&mut self, request: R) {
        self.request_signature = request.signature();
        self.request_summary_arguments = request.summary_arguments();

        if !request.session_id().is_empty() && !request.request_id().is_empty() {
            self.request_arguments = LogContext::new()
                .with_field("session_id", request.session_id())
                .with_field("request_id", request.request_id());
        }

        self.app_request = Some(Arc::new(request));
        self.flush_buffer(false);
    }

    /// Correlation arguments merged into every dispatched entry
    pub fn app_request_arguments(&self) -> &LogContext {
        &self.request_arguments
    }

    pub fn app_response(&self) -> Option<&dyn ResponseDescriptor> {
        self.app_response.as_deref()
    }

    pub fn set_app_response<R: ResponseDescriptor + 'static>(&mut self, response: R) {
        self.response_summary_arguments = response.summary_arguments();
        self.app_response = Some(Arc::new(response));
    }

    /// Entries waiting for a correlation pair
    pub fn buffer(&self) -> &[LogEntry] {
        &self.buffer
    }

    pub fn is_flushing(&self) -> bool {
        !self.request_arguments.is_empty()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Log a message with context
    ///
    /// Context is enriched immediately, so faults and long strings are
    /// captured as they were at the log call.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>, context: LogContext) {
        self.metrics.record_logged();

        let context = self.enricher.enrich(&context);
        self.buffer.push(LogEntry::new(level, message).with_context(context));

        self.flush_buffer(false);
    }

    /// Enrich and buffer an entry without dispatching it
    ///
    /// Used from the panic hook, where a panicking appender would abort the
    /// process. The entry goes out with the next log or flush call.
    pub(crate) fn enqueue(
        &mut self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) {
        self.metrics.record_logged();

        let context = self.enricher.enrich(&context);
        self.buffer.push(LogEntry::new(level, message).with_context(context));
    }

    /// Dispatch buffered entries in FIFO order
    ///
    /// Does nothing while buffering unless `force` is set. While the current
    /// thread is panicking entries stay buffered, since a second panic from
    /// an appender would abort the process.
    pub fn flush_buffer(&mut self, force: bool) {
        if !self.is_flushing() && !force {
            return;
        }

        if std::thread::panicking() {
            return;
        }

        if force {
            self.metrics.record_forced_flush();
        }

        for entry in std::mem::take(&mut self.buffer) {
            self.dispatch(entry);
        }
    }

    /// Arm a forced flush of the buffer when the logger is dropped
    ///
    /// Fails with [`LoggerError::DuplicateRegistration`] when called twice.
    pub fn flush_buffer_on_shutdown(&mut self) -> Result<()> {
        if self.flush_on_shutdown {
            return Err(LoggerError::DuplicateRegistration);
        }

        self.flush_on_shutdown = true;
        Ok(())
    }

    /// Whether [`flush_buffer_on_shutdown`](Self::flush_buffer_on_shutdown) has been called
    pub fn is_shutdown_flush_armed(&self) -> bool {
        self.flush_on_shutdown
    }

    /// Log an INFO entry tagged with an `event` name
    pub fn event(&mut self, name: &str, message: impl Into<String>, context: LogContext) {
        let mut event_context = LogContext::new().with_field("event", name);
        event_context.merge(&context);

        self.info(message, event_context);
    }

    /// Log the request summary event
    ///
    /// Times are given in seconds and logged in whole milliseconds.
    pub fn request_summary(
        &mut self,
        exec_time: f64,
        memory_usage: u64,
        query_count: u64,
        query_exec_time: f64,
    ) {
        let is_cli = self.env_arguments.get("sapi").and_then(FieldValue::as_str) == Some(CLI_SAPI);
        let event_name = if is_cli { "cli_request" } else { "http_request" };

        let measurements = LogContext::new()
            .with_field("signature", self.request_signature.as_str())
            .with_field("exec_time", seconds_to_millis(exec_time))
            .with_field("memory_usage", memory_usage)
            .with_field("query_count", query_count)
            .with_field("query_time", seconds_to_millis(query_exec_time));

        let context = LogContext::merged([
            &self.request_summary_arguments,
            &self.response_summary_arguments,
            &measurements,
        ]);

        self.event(event_name, REQUEST_SUMMARY_MESSAGE, context);
    }

    #[inline]
    pub fn debug(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    #[inline]
    pub fn info(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Info, message, context);
    }

    #[inline]
    pub fn notice(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Notice, message, context);
    }

    #[inline]
    pub fn warning(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Warning, message, context);
    }

    #[inline]
    pub fn error(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Error, message, context);
    }

    #[inline]
    pub fn critical(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Critical, message, context);
    }

    #[inline]
    pub fn alert(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Alert, message, context);
    }

    #[inline]
    pub fn emergency(&mut self, message: impl Into<String>, context: LogContext) {
        self.log(LogLevel::Emergency, message, context);
    }

    /// Flush every appender
    pub fn flush(&mut self) -> Result<()> {
        for appender in self.appenders.iter_mut() {
            appender.flush()?;
        }
        Ok(())
    }

    /// Merge environment and correlation arguments into `entry` and write it
    fn dispatch(&mut self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            self.metrics.record_filtered();
            return;
        }

        entry.context =
            LogContext::merged([&self.env_arguments, &self.request_arguments, &entry.context]);

        if Self::process_sync(&mut self.appenders, &entry) {
            self.metrics.record_sink_failure();
        } else {
            self.metrics.record_dispatched();
        }
    }

    /// Write one entry to every appender with per-appender panic isolation
    ///
    /// Returns true when at least one appender failed.
    fn process_sync(appenders: &mut [Box<dyn Appender>], entry: &LogEntry) -> bool {
        let mut has_error = false;

        for (idx, appender) in appenders.iter_mut().enumerate() {
            let append_result = catch_unwind(AssertUnwindSafe(|| appender.append(entry)));

            match append_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!(
                        "[LOGGER ERROR] Appender #{} ({}) failed: {}",
                        idx,
                        appender.name(),
                        e
                    );
                    has_error = true;
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Appender #{} panicked: {}. \
                         Other appenders continue to function.",
                        idx,
                        panic_message(panic_info.as_ref())
                    );
                    has_error = true;
                }
            }
        }

        has_error
    }
}

impl Default for BufferedLogger {
    fn default() -> Self {
        Self::new(AppEnv::default())
    }
}

impl Drop for BufferedLogger {
    fn drop(&mut self) {
        if std::thread::panicking() {
            if !self.buffer.is_empty() {
                eprintln!(
                    "[LOGGER WARNING] Logger dropped while unwinding, {} buffered entries not dispatched",
                    self.buffer.len()
                );
            }
            return;
        }

        if self.flush_on_shutdown {
            self.flush_buffer(true);
        }

        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        if !self.buffer.is_empty() {
            eprintln!(
                "[LOGGER WARNING] Logger dropped with {} buffered entries that were never dispatched",
                self.buffer.len()
            );
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn seconds_to_millis(seconds: f64) -> i64 {
    if seconds > 0.0 {
        (seconds * 1000.0).ceil() as i64
    } else {
        0
    }
}

/// Builder for constructing BufferedLogger with a fluent API
pub struct LoggerBuilder {
    app_env: Arc<dyn EnvironmentDescriptor>,
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
    chunk_size: usize,
    serializers: Vec<ExceptionSerializer>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            app_env: Arc::new(AppEnv::default()),
            min_level: LogLevel::Debug,
            appenders: Vec::new(),
            chunk_size: 0,
            serializers: Vec::new(),
        }
    }

    /// Set the environment descriptor (defaults to an empty [`AppEnv`])
    #[must_use = "builder methods return a new value"]
    pub fn app_env<E: EnvironmentDescriptor + 'static>(mut self, app_env: E) -> Self {
        self.app_env = Arc::new(app_env);
        self
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    /// Split string context values longer than `chunk_size` characters
    #[must_use = "builder methods return a new value"]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Register an exception serializer
    #[must_use = "builder methods return a new value"]
    pub fn exception_serializer(mut self, serializer: ExceptionSerializer) -> Self {
        self.serializers.push(serializer);
        self
    }

    /// Build the BufferedLogger
    pub fn build(self) -> BufferedLogger {
        let mut logger = BufferedLogger::with_env(self.app_env);

        logger.set_min_level(self.min_level);
        logger.set_chunk_size(self.chunk_size);
        for serializer in self.serializers {
            logger.add_exception_serializer(serializer);
        }
        for appender in self.appenders {
            logger.add_appender(appender);
        }

        logger
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appenders::MemoryAppender;
    use crate::core::fault::Fault;
    use crate::descriptors::{AppEnv, CliRequest, CommandLayout, HttpRequest, HttpResponse};
    use http::{Method, Uri};

    fn logger_with_memory(env: AppEnv) -> (BufferedLogger, MemoryAppender) {
        let memory = MemoryAppender::new();
        let logger = BufferedLogger::builder()
            .app_env(env)
            .appender(memory.clone())
            .build();
        (logger, memory)
    }

    fn request(session_id: &str, request_id: &str) -> HttpRequest {
        let uri: Uri = "/projects".parse().unwrap();
        HttpRequest::new(&Method::GET, &uri).with_correlation(session_id, request_id)
    }

    struct FailingAppender;

    impl Appender for FailingAppender {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            Err(LoggerError::writer("sink unavailable"))
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct PanickingAppender;

    impl Appender for PanickingAppender {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            panic!("appender exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_entries_are_buffered_until_correlation() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        logger.info("first", LogContext::new());
        logger.debug("second", LogContext::new());
        logger.flush_buffer(false);

        assert_eq!(logger.buffer().len(), 2);
        assert!(memory.is_empty());
        assert!(!logger.is_flushing());
    }

    #[test]
    fn test_set_app_request_drains_in_order() {
        let (mut logger, memory) = logger_with_memory(AppEnv::new("Tracker", "1.0", "test"));

        logger.info("first", LogContext::new());
        logger.error("second", LogContext::new());
        logger.set_app_request(request("s-1", "r-1"));

        assert!(logger.buffer().is_empty());
        assert!(logger.is_flushing());
        assert_eq!(memory.messages(), vec!["first", "second"]);

        logger.warning("third", LogContext::new());
        assert!(logger.buffer().is_empty());
        assert_eq!(memory.messages(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispatched_context_merge_order() {
        let env = AppEnv::new("Tracker", "1.0", "test").with_argument("account_id", 12);
        let (mut logger, memory) = logger_with_memory(env);

        logger.set_app_request(request("s-1", "r-1"));
        logger.info(
            "hello",
            LogContext::new()
                .with_field("user", "ilija")
                .with_field("app", "override"),
        );

        let records = memory.records();
        let record = &records[0];
        assert_eq!(
            record.context.keys().collect::<Vec<_>>(),
            vec!["app", "ver", "env", "sapi", "account_id", "session_id", "request_id", "user"]
        );
        assert_eq!(record.context.get("app").and_then(FieldValue::as_str), Some("override"));
        assert_eq!(record.context.get("request_id").and_then(FieldValue::as_str), Some("r-1"));
    }

    #[test]
    fn test_empty_correlation_keeps_buffering() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        logger.info("queued", LogContext::new());
        logger.set_app_request(request("", "r-1"));
        logger.set_app_request(request("s-1", ""));

        assert_eq!(logger.buffer().len(), 1);
        assert!(logger.app_request_arguments().is_empty());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_flushing_never_reverts() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        logger.set_app_request(request("s-1", "r-1"));
        logger.set_app_request(request("", ""));
        logger.info("still flushing", LogContext::new());

        assert!(logger.is_flushing());
        assert!(logger.buffer().is_empty());
        assert_eq!(memory.len(), 1);
        assert_eq!(
            logger.app_request_arguments().get("session_id").and_then(FieldValue::as_str),
            Some("s-1")
        );
    }

    #[test]
    fn test_forced_flush_empties_buffer() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        logger.info("one", LogContext::new());
        logger.info("two", LogContext::new());
        logger.flush_buffer(true);

        assert!(logger.buffer().is_empty());
        assert_eq!(memory.messages(), vec!["one", "two"]);
        assert!(!memory.records()[0].context.contains_key("session_id"));
        assert_eq!(logger.metrics().forced_flushes(), 1);
    }

    #[test]
    fn test_flush_on_shutdown_registration_is_one_shot() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        assert!(logger.flush_buffer_on_shutdown().is_ok());
        assert!(matches!(
            logger.flush_buffer_on_shutdown(),
            Err(LoggerError::DuplicateRegistration)
        ));

        logger.info("pending", LogContext::new());
        drop(logger);

        assert_eq!(memory.messages(), vec!["pending"]);
    }

    #[test]
    fn test_drop_without_registration_discards_buffer() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());
        logger.info("pending", LogContext::new());
        drop(logger);

        assert!(memory.is_empty());
    }

    #[test]
    fn test_min_level_filters_at_dispatch() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());
        logger.set_min_level(LogLevel::Warning);

        logger.debug("quiet", LogContext::new());
        assert_eq!(logger.buffer().len(), 1);

        logger.error("loud", LogContext::new());
        logger.set_app_request(request("s", "r"));

        assert_eq!(memory.messages(), vec!["loud"]);
        assert_eq!(logger.metrics().filtered_count(), 1);
        assert_eq!(logger.metrics().dispatched_count(), 1);
    }

    #[test]
    fn test_context_is_enriched_at_log_time() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());
        logger.set_chunk_size(4);

        logger.error(
            "failed",
            LogContext::new()
                .with_field("exception", Fault::new("RuntimeException", "boom"))
                .with_field("note", "abcdefgh"),
        );
        logger.flush_buffer(true);

        let records = memory.records();
        let context = &records[0].context;
        assert_eq!(context.get("exception").and_then(FieldValue::as_str), Some("boom"));
        assert!(context.contains_key("exception_class"));
        assert_eq!(context.get("note").and_then(FieldValue::as_str), Some("abcd"));
        assert_eq!(context.get("note_1").and_then(FieldValue::as_str), Some("efgh"));
    }

    #[test]
    fn test_event_context_order() {
        let (mut logger, memory) = logger_with_memory(AppEnv::default());

        logger.event("user_signed_in", "Signed in", LogContext::new().with_field("user_id", 3));
        logger.flush_buffer(true);

        let records = memory.records();
        let record = &records[0];
        assert_eq!(record.level, LogLevel::Info);
        let keys: Vec<_> = record.context.keys().collect();
        assert_eq!(&keys[4..], &["event", "user_id"]);
    }

    #[test]
    fn test_cli_request_summary() {
        let (mut logger, memory) = logger_with_memory(AppEnv::new("Tracker", "1.0", "test"));
        let layout = CommandLayout::new(".sh");
        logger.set_app_request(CliRequest::new("7", ["cleanup.sh", "--all"], &layout).unwrap());

        logger.request_summary(0.356, 1_048_576, 15, 0.235);

        let records = memory.records();
        let record = &records[0];
        let context = &record.context;
        assert_eq!(record.message, REQUEST_SUMMARY_MESSAGE);
        assert_eq!(context.get("event").and_then(FieldValue::as_str), Some("cli_request"));
        assert_eq!(context.get("exec_time").and_then(FieldValue::as_i64), Some(356));
        assert_eq!(context.get("memory_usage").and_then(FieldValue::as_i64), Some(1_048_576));
        assert_eq!(context.get("query_count").and_then(FieldValue::as_i64), Some(15));
        assert_eq!(context.get("query_time").and_then(FieldValue::as_i64), Some(235));
        assert_eq!(
            context.get("signature").and_then(FieldValue::as_str),
            Some("~cleanup.sh --all")
        );
        assert_eq!(
            context.get("command_arguments").and_then(FieldValue::as_str),
            Some("--all")
        );
    }

    #[test]
    fn test_http_request_summary() {
        let env = AppEnv::new("Tracker", "1.0", "test").with_sapi("http");
        let (mut logger, memory) = logger_with_memory(env);
        logger.set_app_request(request("s", "r"));
        logger.set_app_response(HttpResponse::new(200, "OK"));

        logger.request_summary(0.0, 0, 0, -1.0);

        let records = memory.records();
        let context = &records[0].context;
        assert_eq!(context.get("event").and_then(FieldValue::as_str), Some("http_request"));
        assert_eq!(context.get("exec_time").and_then(FieldValue::as_i64), Some(0));
        assert_eq!(context.get("query_time").and_then(FieldValue::as_i64), Some(0));
        assert_eq!(context.get("status_code").and_then(FieldValue::as_i64), Some(200));
        assert_eq!(context.get("method").and_then(FieldValue::as_str), Some("GET"));
    }

    #[test]
    fn test_set_app_env_refreshes_arguments() {
        let (mut logger, memory) = logger_with_memory(AppEnv::new("Old", "1", "dev"));
        logger.set_app_env(AppEnv::new("New", "2", "prod"));
        logger.info("x", LogContext::new());
        logger.flush_buffer(true);

        assert_eq!(
            memory.records()[0].context.get("app").and_then(FieldValue::as_str),
            Some("New")
        );
    }

    #[test]
    fn test_failing_appenders_are_isolated() {
        let memory = MemoryAppender::new();
        let mut logger = BufferedLogger::builder()
            .appender(FailingAppender)
            .appender(PanickingAppender)
            .appender(memory.clone())
            .build();

        logger.info("survives", LogContext::new());
        logger.flush_buffer(true);

        assert_eq!(memory.messages(), vec!["survives"]);
        assert_eq!(logger.metrics().sink_failures(), 1);
        assert_eq!(logger.metrics().dispatched_count(), 0);
    }

    #[test]
    fn test_builder_configuration() {
        let logger = BufferedLogger::builder()
            .min_level(LogLevel::Notice)
            .chunk_size(128)
            .exception_serializer(Arc::new(|_: &str, _: &Fault, _: &mut LogContext| {}))
            .build();

        assert_eq!(logger.min_level(), LogLevel::Notice);
        assert_eq!(logger.chunk_size(), 128);
        assert_eq!(logger.exception_serializers().len(), 1);
        assert!(logger.app_request().is_none());
        assert!(logger.app_response().is_none());
    }
}
