//! Bridge from runtime fault signals to log entries
//!
//! An [`ErrorBridge`] maps fault classes to a [`PolicyAction`] and logs,
//! silences or escalates each signal accordingly. Once initialized it is
//! also the process panic hook: panics are queued at CRITICAL as unhandled
//! exceptions before the previous hook runs.

use super::{
    error::{LoggerError, Result},
    fault::Fault,
    log_context::LogContext,
    log_level::LogLevel,
    logger::{BufferedLogger, SharedLogger},
};
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, PanicHookInfo};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type PanicHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Severity class of a runtime error signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaultClass(pub u32);

impl FaultClass {
    pub const ERROR: FaultClass = FaultClass(1);
    pub const WARNING: FaultClass = FaultClass(2);
    pub const PARSE: FaultClass = FaultClass(4);
    pub const NOTICE: FaultClass = FaultClass(8);
    pub const CORE_ERROR: FaultClass = FaultClass(16);
    pub const CORE_WARNING: FaultClass = FaultClass(32);
    pub const COMPILE_ERROR: FaultClass = FaultClass(64);
    pub const COMPILE_WARNING: FaultClass = FaultClass(128);
    pub const USER_ERROR: FaultClass = FaultClass(256);
    pub const USER_WARNING: FaultClass = FaultClass(512);
    pub const USER_NOTICE: FaultClass = FaultClass(1024);
    pub const STRICT: FaultClass = FaultClass(2048);
    pub const RECOVERABLE_ERROR: FaultClass = FaultClass(4096);
    pub const DEPRECATED: FaultClass = FaultClass(8192);
    pub const USER_DEPRECATED: FaultClass = FaultClass(16384);
    pub const ALL: FaultClass = FaultClass(32767);
}

impl fmt::Display for FaultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to do with an error signal of a given class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    Silence,
    LogAsError,
    LogAsNotice,
    RaiseFatal,
}

impl PolicyAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyAction::Silence => "silence",
            PolicyAction::LogAsError => "log_error",
            PolicyAction::LogAsNotice => "log_notice",
            PolicyAction::RaiseFatal => "exception",
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyAction {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "silence" => Ok(PolicyAction::Silence),
            "log_error" => Ok(PolicyAction::LogAsError),
            "log_notice" => Ok(PolicyAction::LogAsNotice),
            "exception" => Ok(PolicyAction::RaiseFatal),
            other => Err(LoggerError::invalid_policy_action(other)),
        }
    }
}

/// Fault class to action mapping
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    actions: HashMap<FaultClass, PolicyAction>,
}

impl PolicyTable {
    /// A table with no entries; every class raises
    pub fn empty() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    pub fn get(&self, code: FaultClass) -> Option<PolicyAction> {
        self.actions.get(&code).copied()
    }

    pub fn set(&mut self, code: FaultClass, action: PolicyAction) {
        self.actions.insert(code, action);
    }

    /// Action for `code`, [`PolicyAction::RaiseFatal`] when unmapped
    pub fn action_for(&self, code: FaultClass) -> PolicyAction {
        self.get(code).unwrap_or(PolicyAction::RaiseFatal)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        use PolicyAction::*;

        let actions = [
            (FaultClass::ERROR, RaiseFatal),
            (FaultClass::WARNING, LogAsError),
            (FaultClass::NOTICE, LogAsError),
            (FaultClass::STRICT, LogAsNotice),
            (FaultClass::PARSE, RaiseFatal),
            (FaultClass::DEPRECATED, LogAsError),
            (FaultClass::CORE_ERROR, RaiseFatal),
            (FaultClass::CORE_WARNING, LogAsError),
            (FaultClass::COMPILE_ERROR, RaiseFatal),
            (FaultClass::COMPILE_WARNING, LogAsError),
            (FaultClass::USER_ERROR, LogAsError),
            (FaultClass::USER_WARNING, LogAsError),
            (FaultClass::USER_NOTICE, LogAsError),
            (FaultClass::USER_DEPRECATED, LogAsError),
            (FaultClass::RECOVERABLE_ERROR, LogAsError),
            (FaultClass::ALL, LogAsError),
        ];

        Self {
            actions: actions.into_iter().collect(),
        }
    }
}

/// Routes error signals and unhandled faults into a shared logger
///
/// At most one bridge should be initialized at a time; call
/// [`ErrorBridge::restore`] before initializing another one.
///
/// # Example
///
/// ```
/// use request_logger::prelude::*;
///
/// let logger = BufferedLogger::builder().build().into_shared();
/// let mut bridge = ErrorBridge::new(logger.clone());
///
/// bridge.set_how_to_handle_error(FaultClass::USER_NOTICE, "silence").unwrap();
/// bridge
///     .handle_error(FaultClass::USER_NOTICE, "ignored", file!(), line!())
///     .unwrap();
///
/// assert!(logger.lock().buffer().is_empty());
/// ```
pub struct ErrorBridge {
    logger: SharedLogger,
    policy: PolicyTable,
    re_throw: Arc<AtomicBool>,
    previous_hook: Option<PanicHook>,
}

impl ErrorBridge {
    pub fn new(logger: SharedLogger) -> Self {
        Self::with_policy(logger, PolicyTable::default())
    }

    pub fn with_policy(logger: SharedLogger, policy: PolicyTable) -> Self {
        Self {
            logger,
            policy,
            re_throw: Arc::new(AtomicBool::new(true)),
            previous_hook: None,
        }
    }

    /// Install this bridge as the process panic hook
    ///
    /// Calling it again while installed does nothing. The hook queues a
    /// CRITICAL entry without dispatching it; the entry goes out with the
    /// logger's next log or flush call.
    ///
    /// The hook sees every panic in the process, including appender panics
    /// that another logger catches and reports itself. Those are logged here
    /// as unhandled too. Panics from this bridge's own logger are not, since
    /// the logger is locked while its appenders run.
    pub fn initialize(&mut self) -> &mut Self {
        if self.previous_hook.is_some() {
            return self;
        }

        let previous: PanicHook = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        let logger = Arc::clone(&self.logger);
        let re_throw = Arc::clone(&self.re_throw);

        panic::set_hook(Box::new(move |info| {
            let fault = Fault::from_panic(info);

            // The panicking thread may already hold the logger
            match logger.try_lock() {
                Some(mut logger) => logger.enqueue(
                    LogLevel::Critical,
                    UNHANDLED_MESSAGE,
                    unhandled_context(&fault),
                ),
                None => eprintln!(
                    "[LOGGER WARNING] Logger is locked, unhandled panic not logged: {}",
                    fault.message
                ),
            }

            if re_throw.load(Ordering::Relaxed) {
                chained(info);
            }
        }));

        self.previous_hook = Some(previous);
        self
    }

    /// Reinstate the panic hook that was active before [`initialize`](Self::initialize)
    pub fn restore(&mut self) -> &mut Self {
        if let Some(previous) = self.previous_hook.take() {
            drop(panic::take_hook());
            panic::set_hook(Box::new(move |info| previous(info)));
        }
        self
    }

    pub fn is_installed(&self) -> bool {
        self.previous_hook.is_some()
    }

    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn get_how_to_handle_error(&self, code: FaultClass) -> Option<PolicyAction> {
        self.policy.get(code)
    }

    /// Set the action for `code` from its name
    ///
    /// Fails with [`LoggerError::InvalidPolicyAction`] for unknown names.
    pub fn set_how_to_handle_error(&mut self, code: FaultClass, action: &str) -> Result<&mut Self> {
        let action = action.parse()?;
        Ok(self.set_policy(code, action))
    }

    pub fn set_policy(&mut self, code: FaultClass, action: PolicyAction) -> &mut Self {
        self.policy.set(code, action);
        self
    }

    /// Handle one error signal according to the policy table
    ///
    /// Returns [`LoggerError::FaultEscalation`] when the class is configured
    /// (or defaults) to raise.
    pub fn handle_error(
        &self,
        code: FaultClass,
        message: &str,
        file: &str,
        line: u32,
    ) -> Result<()> {
        let action = self.policy.action_for(code);

        let template = match action {
            PolicyAction::Silence => return Ok(()),
            PolicyAction::RaiseFatal => {
                return Err(LoggerError::fault_escalation(message, code.0, file, line));
            }
            PolicyAction::LogAsError => "Error: {message}",
            PolicyAction::LogAsNotice => "Strict standards: {message}",
        };

        let context = LogContext::new()
            .with_field("message", message)
            .with_field("code", code.0)
            .with_field("file", file)
            .with_field("line", line)
            .with_field("trace", Backtrace::force_capture().to_string());

        let mut logger = self.logger.lock();
        if action == PolicyAction::LogAsNotice {
            logger.notice(template, context);
        } else {
            logger.error(template, context);
        }

        Ok(())
    }

    /// Log an unhandled fault at CRITICAL
    ///
    /// The fault is handed back as `Err` when re-throwing is enabled so the
    /// caller can propagate it.
    pub fn handle_exception(&self, fault: Fault) -> std::result::Result<(), Fault> {
        log_unhandled(&mut self.logger.lock(), &fault);

        if self.get_re_throw_exception() {
            Err(fault)
        } else {
            Ok(())
        }
    }

    pub fn get_re_throw_exception(&self) -> bool {
        self.re_throw.load(Ordering::Relaxed)
    }

    pub fn set_re_throw_exception(&mut self, re_throw: bool) -> &mut Self {
        self.re_throw.store(re_throw, Ordering::Relaxed);
        self
    }
}

impl fmt::Debug for ErrorBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBridge")
            .field("policy", &self.policy)
            .field("re_throw", &self.get_re_throw_exception())
            .field("installed", &self.is_installed())
            .finish()
    }
}

impl Drop for ErrorBridge {
    fn drop(&mut self) {
        if self.is_installed() && !std::thread::panicking() {
            self.restore();
        }
    }
}

const UNHANDLED_MESSAGE: &str = "Unhandled exception: {message}";

fn unhandled_context(fault: &Fault) -> LogContext {
    LogContext::new()
        .with_field("class", fault.class_name.as_str())
        .with_field("message", fault.message.as_str())
        .with_field("exception", fault.clone())
}

fn log_unhandled(logger: &mut BufferedLogger, fault: &Fault) {
    logger.critical(UNHANDLED_MESSAGE, unhandled_context(fault));
}
