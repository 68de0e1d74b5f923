//! Queued appender
//!
//! Moves any appender onto a dedicated worker thread. Entries travel through a
//! bounded FIFO channel; `append` blocks while the queue is full, so ordering
//! is kept and nothing is dropped.

use crate::core::logger::panic_message;
use crate::core::{Appender, LogEntry, LoggerError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// Default queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Maximum time to wait for the worker when flushing or shutting down
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

enum Command {
    Append(LogEntry),
    Flush(Sender<Result<()>>),
}

/// Appender running its inner appender on a worker thread
///
/// # Example
///
/// ```
/// use request_logger::appenders::{MemoryAppender, QueuedAppender};
/// use request_logger::prelude::*;
///
/// let records = MemoryAppender::new();
/// let queued = QueuedAppender::new(records.clone(), 64);
///
/// let mut logger = BufferedLogger::builder().appender(queued).build();
/// logger.info("Handled off-thread", LogContext::new());
/// logger.flush_buffer(true);
/// logger.flush().expect("flush failed");
///
/// assert_eq!(records.len(), 1);
/// ```
pub struct QueuedAppender {
    name: String,
    sender: Option<Sender<Command>>,
    worker: Option<thread::JoinHandle<()>>,
    timeout: Duration,
}

impl QueuedAppender {
    /// Wrap `inner` behind a queue holding at most `capacity` entries
    pub fn new<A: Appender + 'static>(inner: A, capacity: usize) -> Self {
        let name = format!("queued({})", inner.name());
        let (sender, receiver) = bounded(capacity.max(1));

        let worker = thread::spawn(move || Self::run(Box::new(inner), receiver));

        Self {
            name,
            sender: Some(sender),
            worker: Some(worker),
            timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Maximum time `flush` and shutdown wait for the worker
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(mut inner: Box<dyn Appender>, receiver: Receiver<Command>) {
        while let Ok(command) = receiver.recv() {
            match command {
                Command::Append(entry) => {
                    match catch_unwind(AssertUnwindSafe(|| inner.append(&entry))) {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            eprintln!("[LOGGER ERROR] Queued appender ({}) failed: {}", inner.name(), e);
                        }
                        Err(panic_info) => {
                            eprintln!(
                                "[LOGGER CRITICAL] Queued appender ({}) panicked: {}",
                                inner.name(),
                                panic_message(panic_info.as_ref())
                            );
                        }
                    }
                }
                Command::Flush(ack) => {
                    let _ = ack.send(inner.flush());
                }
            }
        }

        // Channel closed: everything queued has been written
        if let Err(e) = inner.flush() {
            eprintln!("[LOGGER ERROR] Queued appender ({}) failed to flush: {}", inner.name(), e);
        }
    }

    fn sender(&self) -> Result<&Sender<Command>> {
        self.sender.as_ref().ok_or(LoggerError::ChannelSendError)
    }

    /// Close the queue and wait for the worker to drain it
    ///
    /// Returns `true` when the worker finished within `timeout`.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.worker.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Queued appender worker panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Queued appender worker did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Appender for QueuedAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        self.sender()?
            .send(Command::Append(entry.clone()))
            .map_err(|_| LoggerError::ChannelSendError)
    }

    /// Wait until every entry queued so far has been written and flushed
    fn flush(&mut self) -> Result<()> {
        let (ack_sender, ack_receiver) = bounded(1);

        self.sender()?
            .send(Command::Flush(ack_sender))
            .map_err(|_| LoggerError::ChannelSendError)?;

        ack_receiver.recv_timeout(self.timeout).map_err(|_| {
            LoggerError::writer(format!(
                "Queued appender did not flush within {:?}",
                self.timeout
            ))
        })?
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for QueuedAppender {
    fn drop(&mut self) {
        let timeout = self.timeout;
        self.shutdown(timeout);
    }
}
