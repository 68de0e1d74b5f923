//! Error types for the request logger

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Shutdown flush armed twice on the same logger
    #[error("Buffer flush function should be registered only once")]
    DuplicateRegistration,

    /// Unknown action name passed to the error policy table
    #[error("Invalid error handler '{action}'")]
    InvalidPolicyAction { action: String },

    /// CLI argument vector without a recognizable script token
    #[error("Command '{command}' is not a recognized CLI command")]
    UnmappedCommand { command: String },

    /// Error signal escalated to a fault by the policy table
    #[error("{message} (code {code}) in {file}:{line}")]
    FaultEscalation {
        message: String,
        code: u32,
        file: String,
        line: u32,
    },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Channel send error
    #[error("Failed to send log entry to appender worker")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid policy action error
    pub fn invalid_policy_action(action: impl Into<String>) -> Self {
        LoggerError::InvalidPolicyAction {
            action: action.into(),
        }
    }

    /// Create an unmapped command error
    pub fn unmapped_command(command: impl Into<String>) -> Self {
        LoggerError::UnmappedCommand {
            command: command.into(),
        }
    }

    /// Create a fault escalation error
    pub fn fault_escalation(
        message: impl Into<String>,
        code: u32,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        LoggerError::FaultEscalation {
            message: message.into(),
            code,
            file: file.into(),
            line,
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
