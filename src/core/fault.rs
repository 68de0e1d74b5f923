//! Fault chains carried in log context
//!
//! A `Fault` is the captured form of a runtime failure: its class, message,
//! code, origin and trace, plus an optional link to the fault that caused it.
//! The context enricher flattens a fault chain into plain context keys.

use super::log_context::{FieldValue, LogContext};
use super::logger::panic_message;
use serde::Serialize;
use std::any::type_name;
use std::backtrace::Backtrace;
use std::error::Error;
use std::panic::{Location, PanicHookInfo};

/// Captured runtime failure with an optional cause
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct Fault {
    #[serde(rename = "class")]
    pub class_name: String,
    pub message: String,
    pub code: i64,
    pub file: String,
    pub line: u32,
    pub trace: String,
    #[source]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Box<Fault>>,
    /// Extra parameters that exception serializers may expose
    #[serde(skip_serializing_if = "LogContext::is_empty")]
    pub params: LogContext,
}

impl Fault {
    /// Create a fault raised at the caller's location
    #[track_caller]
    pub fn new(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            class_name: class_name.into(),
            message: message.into(),
            code: 0,
            file: location.file().to_string(),
            line: location.line(),
            trace: Backtrace::force_capture().to_string(),
            previous: None,
            params: LogContext::new(),
        }
    }

    /// Capture an error and its `source()` chain
    ///
    /// The top-level class name is the error's type name. Sources that are
    /// themselves faults are kept as-is.
    #[track_caller]
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let mut fault = Fault::new(type_name::<E>(), error.to_string());
        fault.previous = error.source().map(|source| Box::new(Self::from_source(source)));
        fault
    }

    fn from_source(error: &(dyn Error + 'static)) -> Self {
        if let Some(fault) = error.downcast_ref::<Fault>() {
            return fault.clone();
        }

        Self {
            class_name: "dyn Error".to_string(),
            message: error.to_string(),
            code: 0,
            file: String::new(),
            line: 0,
            trace: String::new(),
            previous: error.source().map(|source| Box::new(Self::from_source(source))),
            params: LogContext::new(),
        }
    }

    /// Convert a panic report into a fault
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let message = panic_message(info.payload());

        let (file, line) = info
            .location()
            .map(|location| (location.file().to_string(), location.line()))
            .unwrap_or_default();

        Self {
            class_name: "panic".to_string(),
            message,
            code: 0,
            file,
            line,
            trace: Backtrace::force_capture().to_string(),
            previous: None,
            params: LogContext::new(),
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    #[must_use]
    pub fn with_previous(mut self, previous: Fault) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    #[must_use]
    pub fn with_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.params.insert(key, value);
        self
    }

    /// Iterate this fault followed by its previous faults
    pub fn chain(&self) -> impl Iterator<Item = &Fault> {
        std::iter::successors(Some(self), |fault| fault.previous.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: std::io::Error,
    }

    #[test]
    fn test_new_records_caller_location() {
        let fault = Fault::new("LogicException", "This is a logic exception");

        assert_eq!(fault.file, file!());
        assert_eq!(fault.line, line!() - 3);
        assert_eq!(fault.code, 0);
        assert!(!fault.trace.is_empty());
    }

    #[test]
    fn test_chain() {
        let fault = Fault::new("RuntimeException", "outer")
            .with_code(123)
            .with_previous(Fault::new("LogicException", "inner"));

        let messages: Vec<_> = fault.chain().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["outer", "inner"]);
        assert!(fault.source().is_some());
    }

    #[test]
    fn test_from_error_walks_sources() {
        let error = Outer {
            inner: std::io::Error::new(std::io::ErrorKind::NotFound, "file missing"),
        };

        let fault = Fault::from_error(&error);

        assert!(fault.class_name.ends_with("Outer"));
        assert_eq!(fault.message, "outer failure");
        assert_eq!(fault.chain().count(), 2);
        assert_eq!(fault.previous.as_ref().map(|p| p.message.as_str()), Some("file missing"));
    }

    #[test]
    fn test_serializes_class_key() {
        let fault = Fault::new("FileDnxError", "missing").with_trace("");
        let json = serde_json::to_value(&fault).unwrap();

        assert_eq!(json["class"], "FileDnxError");
        assert!(json.get("previous").is_none());
    }
}
