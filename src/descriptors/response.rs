//! HTTP response descriptor

use super::ResponseDescriptor;
use crate::core::LogContext;
use http::{Response, StatusCode};

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    status_code: u16,
    reason_phrase: String,
}

impl HttpResponse {
    pub fn new(status_code: u16, reason_phrase: impl Into<String>) -> Self {
        Self {
            status_code,
            reason_phrase: reason_phrase.into(),
        }
    }

    /// Describe a response using the canonical reason for its status
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(status.as_u16(), status.canonical_reason().unwrap_or_default())
    }

    pub fn from_response<B>(response: &Response<B>) -> Self {
        Self::from_status(response.status())
    }
}

impl ResponseDescriptor for HttpResponse {
    fn summary_arguments(&self) -> LogContext {
        let mut summary = LogContext::new();

        if self.status_code != 0 {
            summary.insert("status_code", self.status_code);
        }
        if !self.reason_phrase.is_empty() {
            summary.insert("reason_phrase", self.reason_phrase.as_str());
        }

        summary
    }
}
