//! Logger metrics for observability
//!
//! Counters describing what happened to log calls: how many were made,
//! how many reached the sinks, how many were filtered out by the minimum
//! level and how many sink writes failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for buffered logger activity
///
/// # Example
///
/// ```
/// use request_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged();
/// metrics.record_dispatched();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.dispatched_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Log calls accepted by the logger
    total_logged: AtomicU64,

    /// Entries handed to every appender without error
    dispatched_count: AtomicU64,

    /// Entries below the minimum level at dispatch time
    filtered_count: AtomicU64,

    /// Entries at least one appender failed to write
    sink_failures: AtomicU64,

    /// Flushes forced regardless of correlation state
    forced_flushes: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            dispatched_count: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            forced_flushes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn forced_flushes(&self) -> u64 {
        self.forced_flushes.load(Ordering::Relaxed)
    }

    /// Record a log call
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_forced_flush(&self) -> u64 {
        self.forced_flushes.fetch_add(1, Ordering::Relaxed)
    }

    /// Sink failure rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been dispatched yet.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.sink_failures() as f64;
        let total = self.dispatched_count() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.dispatched_count.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.forced_flushes.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            dispatched_count: AtomicU64::new(self.dispatched_count()),
            filtered_count: AtomicU64::new(self.filtered_count()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            forced_flushes: AtomicU64::new(self.forced_flushes()),
        }
    }
}
