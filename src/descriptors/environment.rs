//! Application environment descriptor

use super::EnvironmentDescriptor;
use crate::core::{FieldValue, LogContext};

/// Runtime variant marking command line processes
pub const CLI_SAPI: &str = "cli";

/// Application name, version, deployment tier and runtime variant
#[derive(Debug, Clone, PartialEq)]
pub struct AppEnv {
    pub app: String,
    pub ver: String,
    pub env: String,
    pub sapi: String,
    additional: LogContext,
}

fn default_sapi() -> String {
    CLI_SAPI.to_string()
}

impl AppEnv {
    /// Create an environment for a command line process
    pub fn new(app: impl Into<String>, ver: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            ver: ver.into(),
            env: env.into(),
            sapi: default_sapi(),
            additional: LogContext::new(),
        }
    }

    #[must_use]
    pub fn with_sapi(mut self, sapi: impl Into<String>) -> Self {
        self.sapi = sapi.into();
        self
    }

    #[must_use]
    pub fn with_argument<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.additional.insert(key, value);
        self
    }

    pub fn additional_arguments(&self) -> &LogContext {
        &self.additional
    }

    pub fn set_additional_arguments(&mut self, arguments: LogContext) {
        self.additional = arguments;
    }

    pub fn is_cli(&self) -> bool {
        self.sapi == CLI_SAPI
    }
}

impl Default for AppEnv {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

impl EnvironmentDescriptor for AppEnv {
    fn arguments(&self) -> LogContext {
        let mut arguments = LogContext::new()
            .with_field("app", self.app.as_str())
            .with_field("ver", self.ver.as_str())
            .with_field("env", self.env.as_str())
            .with_field("sapi", self.sapi.as_str());
        arguments.merge(&self.additional);
        arguments
    }
}
