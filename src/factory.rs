//! Logger construction from configuration
//!
//! A [`LoggerConfig`] names the application, the minimum level and one sink.
//! [`LoggerFactory`] turns it into a ready [`BufferedLogger`], copying its
//! additional environment arguments and exception serializers into every
//! logger it creates.
//!
//! ```toml
//! app_name = "Tracker"
//! app_version = "1.0.0"
//! app_env = "production"
//! level = "info"
//!
//! [sink]
//! type = "file"
//! dir = "/var/log/tracker"
//! max_files = 14
//!
//! [error_policy]
//! 8192 = "silence"
//! ```

use crate::appenders::{
    GelfAppender, MemoryAppender, NullAppender, QueuedAppender, RotatingFileAppender,
};
use crate::core::{
    Appender, BufferedLogger, ExceptionSerializer, FaultClass, FieldValue, LogContext, LogLevel,
    LoggerError, OutputFormat, PolicyAction, PolicyTable, Result,
};
use crate::descriptors::{AppEnv, CLI_SAPI};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Strings longer than this are split when logging to Graylog
pub const GRAYLOG_CHUNK_SIZE: usize = 32766;

const SINK_TYPES: [&str; 4] = ["file", "graylog", "blackhole", "test"];

fn default_level() -> LogLevel {
    LogLevel::LOG_FOR_PRODUCTION
}

fn default_sapi() -> String {
    CLI_SAPI.to_string()
}

fn default_file_name() -> String {
    "log.txt".to_string()
}

fn default_max_files() -> usize {
    7
}

fn default_permissions() -> u32 {
    0o644
}

fn default_graylog_host() -> String {
    "127.0.0.1".to_string()
}

fn default_graylog_port() -> u16 {
    12201
}

/// Where log entries go
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    /// Daily rotating files in `dir`
    File {
        #[serde(default)]
        dir: String,
        #[serde(default = "default_file_name")]
        file_name: String,
        #[serde(default = "default_max_files")]
        max_files: usize,
        #[serde(default = "default_permissions")]
        permissions: u32,
        #[serde(default)]
        locking: bool,
        #[serde(default)]
        format: OutputFormat,
    },
    /// GELF over UDP
    Graylog {
        #[serde(default = "default_graylog_host")]
        host: String,
        #[serde(default = "default_graylog_port")]
        port: u16,
    },
    /// Discard everything
    Blackhole,
    /// Keep entries in the factory's memory appender
    Test,
}

impl SinkConfig {
    /// File sink for `dir` with default settings
    pub fn file(dir: impl Into<String>) -> Self {
        SinkConfig::File {
            dir: dir.into(),
            file_name: default_file_name(),
            max_files: default_max_files(),
            permissions: default_permissions(),
            locking: false,
            format: OutputFormat::default(),
        }
    }

    /// Graylog sink with default host and port
    pub fn graylog() -> Self {
        SinkConfig::Graylog {
            host: default_graylog_host(),
            port: default_graylog_port(),
        }
    }

    /// Default configuration for a sink type name
    pub fn from_type(sink_type: &str) -> Result<Self> {
        match sink_type {
            "file" => Ok(Self::file("")),
            "graylog" => Ok(Self::graylog()),
            "blackhole" => Ok(SinkConfig::Blackhole),
            "test" => Ok(SinkConfig::Test),
            other => Err(unknown_sink_type(other)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SinkConfig::File { .. } => "file",
            SinkConfig::Graylog { .. } => "graylog",
            SinkConfig::Blackhole => "blackhole",
            SinkConfig::Test => "test",
        }
    }
}

fn unknown_sink_type(sink_type: &str) -> LoggerError {
    LoggerError::config("sink", format!("Unknown logger type '{}'", sink_type))
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggerConfig {
    pub app_name: String,
    pub app_version: String,
    pub app_env: String,
    #[serde(default = "default_sapi")]
    pub sapi: String,
    #[serde(default = "default_level")]
    pub level: LogLevel,
    pub sink: SinkConfig,
    /// Run the sink on a worker thread behind a queue of this capacity
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    /// Fault class code to action name overrides
    #[serde(default)]
    pub error_policy: BTreeMap<String, String>,
}

impl LoggerConfig {
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        app_env: impl Into<String>,
        sink: SinkConfig,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            app_env: app_env.into(),
            sapi: default_sapi(),
            level: default_level(),
            sink,
            queue_capacity: None,
            error_policy: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Parse a TOML document
    ///
    /// # Errors
    ///
    /// Unknown sink types fail with `Unknown logger type '<t>'`; any other
    /// malformed document fails with [`LoggerError::ConfigParse`].
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let document: toml::Table = text.parse()?;

        if let Some(sink_type) = document
            .get("sink")
            .and_then(|sink| sink.get("type"))
            .and_then(|sink_type| sink_type.as_str())
        {
            if !SINK_TYPES.contains(&sink_type) {
                return Err(unknown_sink_type(sink_type));
            }
        }

        Ok(toml::from_str(text)?)
    }

    /// Load and parse a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "read logger configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;

        Self::from_toml_str(&text)
    }

    /// Default policy table with the `[error_policy]` overrides applied
    pub fn policy_table(&self) -> Result<PolicyTable> {
        let mut table = PolicyTable::default();

        for (code, action) in &self.error_policy {
            let code: u32 = code.trim().parse().map_err(|_| {
                LoggerError::config("error_policy", format!("'{}' is not a fault class code", code))
            })?;
            table.set(FaultClass(code), action.parse::<PolicyAction>()?);
        }

        Ok(table)
    }
}

/// Creates loggers from [`LoggerConfig`]
#[derive(Clone, Default)]
pub struct LoggerFactory {
    additional_env_arguments: LogContext,
    serializers: Vec<ExceptionSerializer>,
    test_appender: MemoryAppender,
}

impl LoggerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn additional_env_arguments(&self) -> &LogContext {
        &self.additional_env_arguments
    }

    pub fn set_additional_env_arguments(&mut self, arguments: LogContext) -> &mut Self {
        self.additional_env_arguments = arguments;
        self
    }

    #[must_use]
    pub fn with_env_argument<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.additional_env_arguments.insert(key, value);
        self
    }

    pub fn add_exception_serializer(&mut self, serializer: ExceptionSerializer) -> &mut Self {
        self.serializers.push(serializer);
        self
    }

    pub fn exception_serializers(&self) -> &[ExceptionSerializer] {
        &self.serializers
    }

    /// Records shared by every logger created with the `test` sink
    pub fn test_appender(&self) -> &MemoryAppender {
        &self.test_appender
    }

    /// Build a logger for `config`
    ///
    /// # Errors
    ///
    /// Returns error when the sink cannot be opened
    pub fn create(&self, config: &LoggerConfig) -> Result<BufferedLogger> {
        let mut app_env = AppEnv::new(&config.app_name, &config.app_version, &config.app_env)
            .with_sapi(&config.sapi);
        app_env.set_additional_arguments(self.additional_env_arguments.clone());

        let chunk_size = match config.sink {
            SinkConfig::Graylog { .. } => GRAYLOG_CHUNK_SIZE,
            _ => 0,
        };

        let mut logger = BufferedLogger::builder()
            .app_env(app_env)
            .min_level(config.level)
            .chunk_size(chunk_size)
            .build();

        for serializer in &self.serializers {
            logger.add_exception_serializer(serializer.clone());
        }

        let appender = self.sink_appender(&config.sink)?;
        match config.queue_capacity {
            Some(capacity) => logger.add_appender(Box::new(QueuedAppender::new(appender, capacity))),
            None => logger.add_appender(appender),
        }

        Ok(logger)
    }

    fn sink_appender(&self, sink: &SinkConfig) -> Result<Box<dyn Appender>> {
        match sink {
            SinkConfig::File {
                dir,
                file_name,
                max_files,
                permissions,
                locking,
                format,
            } => {
                if dir.is_empty() {
                    return Err(LoggerError::config("file", "Log directory argument is required"));
                }

                if !is_writable_dir(Path::new(dir)) {
                    return Err(LoggerError::config(
                        "file",
                        format!("We can't write logs to '{}'", dir),
                    ));
                }

                let appender = RotatingFileAppender::new(Path::new(dir).join(file_name))?
                    .with_max_files(*max_files)
                    .with_permissions(*permissions)
                    .with_locking(*locking)
                    .with_format(*format);

                Ok(Box::new(appender))
            }
            SinkConfig::Graylog { host, port } => {
                Ok(Box::new(GelfAppender::new(format!("{}:{}", host, port))?))
            }
            SinkConfig::Blackhole => Ok(Box::new(NullAppender::new())),
            SinkConfig::Test => Ok(Box::new(self.test_appender.clone())),
        }
    }
}

fn is_writable_dir(dir: &Path) -> bool {
    fs::metadata(dir)
        .map(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
        .unwrap_or(false)
}
