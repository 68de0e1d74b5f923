//! Command line request descriptor

use super::{signature_with_tail, RequestDescriptor};
use crate::core::{LogContext, LoggerError, Result};
use chrono::Utc;

/// How commands appear in a process argument vector
///
/// A command is the first argument ending with `script_suffix`. When that
/// argument is the `dispatcher` script, the command is the argument that
/// follows it instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLayout {
    pub script_suffix: String,
    pub dispatcher: Option<String>,
}

impl CommandLayout {
    pub fn new(script_suffix: impl Into<String>) -> Self {
        Self {
            script_suffix: script_suffix.into(),
            dispatcher: None,
        }
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: impl Into<String>) -> Self {
        self.dispatcher = Some(dispatcher.into());
        self
    }

    /// Index of the command in `arguments`
    fn command_index(&self, arguments: &[String]) -> Option<usize> {
        let index = arguments
            .iter()
            .position(|argument| argument.ends_with(&self.script_suffix))?;

        match &self.dispatcher {
            Some(dispatcher) if arguments[index].ends_with(dispatcher.as_str()) => {
                Some(index + 1).filter(|next| *next < arguments.len())
            }
            _ => Some(index),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliRequest {
    instance_id: String,
    command: String,
    command_arguments: String,
    request_id: String,
}

impl CliRequest {
    /// Describe a command line invocation
    ///
    /// Fails with [`LoggerError::UnmappedCommand`] when no argument matches
    /// the layout.
    pub fn new<I, S>(instance_id: impl Into<String>, arguments: I, layout: &CommandLayout) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_timestamp(instance_id, arguments, layout, Utc::now().timestamp())
    }

    /// Describe an invocation started at `timestamp` (unix seconds)
    pub fn with_timestamp<I, S>(
        instance_id: impl Into<String>,
        arguments: I,
        layout: &CommandLayout,
        timestamp: i64,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let arguments: Vec<String> = arguments.into_iter().map(Into::into).collect();

        let index = layout
            .command_index(&arguments)
            .ok_or_else(|| LoggerError::unmapped_command(arguments.join(" ")))?;

        let command = arguments[index].clone();
        let command_arguments = arguments[index + 1..]
            .iter()
            .map(|argument| quote_argument(argument))
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            instance_id: instance_id.into(),
            request_id: format!("{}/{}", command, timestamp),
            command,
            command_arguments,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn command_arguments(&self) -> &str {
        &self.command_arguments
    }
}

/// Single-quote arguments that contain spaces
fn quote_argument(argument: &str) -> String {
    if argument.contains(' ') {
        format!("'{}'", argument.replace('\'', r"'\''"))
    } else {
        argument.to_string()
    }
}

impl RequestDescriptor for CliRequest {
    fn session_id(&self) -> &str {
        &self.instance_id
    }

    fn request_id(&self) -> &str {
        &self.request_id
    }

    fn summary_arguments(&self) -> LogContext {
        LogContext::new().with_field("command_arguments", self.command_arguments.as_str())
    }

    fn signature(&self) -> String {
        signature_with_tail(format!("~{}", self.command), ' ', &self.command_arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> CommandLayout {
        CommandLayout::new(".sh").with_dispatcher("tasks-cli.sh")
    }

    #[test]
    fn test_direct_script() {
        let request = CliRequest::with_timestamp(
            "42",
            ["/usr/bin/env", "/opt/tasks/cleanup.sh", "--days", "30"],
            &layout(),
            1_700_000_000,
        )
        .unwrap();

        assert_eq!(request.command(), "/opt/tasks/cleanup.sh");
        assert_eq!(request.session_id(), "42");
        assert_eq!(request.request_id(), "/opt/tasks/cleanup.sh/1700000000");
        assert_eq!(request.signature(), "~/opt/tasks/cleanup.sh --days 30");
    }

    #[test]
    fn test_dispatcher_runs_next_argument() {
        let request = CliRequest::with_timestamp(
            "1",
            ["tasks-cli.sh", "send_digest", "Weekly digest", "it's"],
            &layout(),
            10,
        )
        .unwrap();

        assert_eq!(request.command(), "send_digest");
        assert_eq!(request.command_arguments(), "'Weekly digest' it's");
        assert_eq!(request.signature(), "~send_digest 'Weekly digest' it's");
        assert_eq!(request.request_id(), "send_digest/10");
    }

    #[test]
    fn test_quotes_embedded_single_quotes() {
        assert_eq!(quote_argument("it's here"), r"'it'\''s here'");
    }

    #[test]
    fn test_unmapped_command() {
        let result = CliRequest::new("1", ["ls", "-la"], &layout());
        assert!(matches!(result, Err(LoggerError::UnmappedCommand { .. })));

        let trailing_dispatcher = CliRequest::new("1", ["tasks-cli.sh"], &layout());
        assert!(trailing_dispatcher.is_err());
    }

    #[test]
    fn test_long_arguments_are_truncated() {
        let argument = "a".repeat(50);
        let request =
            CliRequest::with_timestamp("1", ["job.sh", argument.as_str()], &layout(), 0).unwrap();

        assert_eq!(request.signature(), format!("~job.sh {}...", "a".repeat(45)));
        assert_eq!(
            request.summary_arguments().get("command_arguments").and_then(|v| v.as_str()),
            Some(argument.as_str())
        );
    }
}
