//! Panic hook tests for the error bridge
//!
//! The panic hook is process-wide, so everything touching it lives in this
//! test binary and the scenarios run in sequence inside a single test.

use request_logger::appenders::MemoryAppender;
use request_logger::prelude::*;
use std::panic::{self, AssertUnwindSafe};

struct ExplodingAppender;

impl Appender for ExplodingAppender {
    fn append(&mut self, _entry: &LogEntry) -> Result<()> {
        panic!("appender exploded");
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "exploding"
    }
}

fn correlated(logger: &SharedLogger) {
    let uri: http::Uri = "/jobs".parse().expect("Invalid URI");
    logger
        .lock()
        .set_app_request(HttpRequest::new(&http::Method::GET, &uri).with_correlation("s", "r"));
}

#[test]
fn test_panic_hook_scenarios() {
    hook_logs_and_restores();
    exploding_appender_under_hook();
    shutdown_flush_while_unwinding();
}

fn hook_logs_and_restores() {
    let memory = MemoryAppender::new();
    let logger = BufferedLogger::builder()
        .appender(memory.clone())
        .build()
        .into_shared();

    let mut bridge = ErrorBridge::new(logger.clone());
    bridge.set_re_throw_exception(false).initialize();
    assert!(bridge.is_installed());

    let result = panic::catch_unwind(|| {
        panic!("worker crashed");
    });
    assert!(result.is_err());

    // Buffered until the request is known
    assert!(memory.is_empty());
    logger.lock().flush_buffer(true);

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, LogLevel::Critical);
    assert_eq!(
        records[0].context.get("message").and_then(|v| v.as_str()),
        Some("worker crashed")
    );
    assert_eq!(
        records[0].context.get("exception_class").and_then(|v| v.as_str()),
        Some("panic")
    );
    assert!(records[0]
        .context
        .get("exception_file")
        .and_then(|v| v.as_str())
        .is_some_and(|file| file.ends_with("error_bridge_tests.rs")));

    // A panic raised while the logger is held must not deadlock
    let result = {
        let _guard = logger.lock();
        panic::catch_unwind(|| {
            panic!("while locked");
        })
    };
    assert!(result.is_err());
    assert_eq!(logger.lock().buffer().len(), 0);

    bridge.restore();
    assert!(!bridge.is_installed());

    let result = panic::catch_unwind(|| {
        panic!("after restore");
    });
    assert!(result.is_err());
    logger.lock().flush_buffer(true);
    assert_eq!(memory.len(), 1);
}

fn exploding_appender_under_hook() {
    let memory = MemoryAppender::new();
    let logger = BufferedLogger::builder()
        .appender(ExplodingAppender)
        .appender(memory.clone())
        .build()
        .into_shared();
    correlated(&logger);

    let mut bridge = ErrorBridge::new(logger.clone());
    bridge.set_re_throw_exception(false).initialize();

    let result = panic::catch_unwind(|| {
        panic!("user panic");
    });
    assert!(result.is_err());

    // Queued by the hook, not written from inside it
    assert!(memory.is_empty());
    assert_eq!(logger.lock().buffer().len(), 1);

    bridge.restore();
    logger.lock().flush_buffer(false);

    let records = memory.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].level, LogLevel::Critical);
    assert_eq!(records[0].context.get("session_id").and_then(|v| v.as_str()), Some("s"));
    assert_eq!(logger.lock().metrics().sink_failures(), 1);
    assert!(logger.lock().buffer().is_empty());
}

fn shutdown_flush_while_unwinding() {
    let memory = MemoryAppender::new();
    let inner = memory.clone();

    let result = panic::catch_unwind(AssertUnwindSafe(move || {
        let mut logger = BufferedLogger::builder()
            .appender(ExplodingAppender)
            .appender(inner)
            .build();
        logger.info("never correlated", LogContext::new());
        logger.flush_buffer_on_shutdown().expect("First registration succeeds");
        panic!("job failed");
    }));

    // The logger is dropped during unwinding without touching its appenders
    assert!(result.is_err());
    assert!(memory.is_empty());
}
