//! Output format configuration for log entries
//!
//! Provides the two line formats used by the file sinks:
//! - Text: Human-readable format (default)
//! - Json: One JSON object per line

use super::log_context::LogContext;
use super::log_entry::LogEntry;
use serde::{Deserialize, Serialize};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for log entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text format (default)
    ///
    /// Example: `[2025-01-08 10:30:45] INFO: Request processed {"user_id":7}`
    #[default]
    Text,

    /// JSON format for machine processing
    ///
    /// Example: `{"datetime":"2025-01-08 10:30:45","level":"INFO","message":"Request processed","context":{}}`
    Json,
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry) -> String {
        match self {
            OutputFormat::Text => format_text(entry),
            OutputFormat::Json => format_json(entry),
        }
    }
}

/// Replace `{key}` placeholders with values from `context`
///
/// Placeholders without a matching key are left as written.
pub fn interpolate(template: &str, context: &LogContext) -> String {
    if !template.contains('{') || context.is_empty() {
        return template.to_string();
    }

    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match context.get(key) {
                    Some(value) => result.push_str(&value.to_string()),
                    None => {
                        result.push('{');
                        result.push_str(key);
                        result.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                result.push('{');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn format_text(entry: &LogEntry) -> String {
    let base = format!(
        "[{}] {}: {}",
        entry.timestamp.format(DATETIME_FORMAT),
        entry.level.to_str(),
        interpolate(&entry.message, &entry.context)
    );

    if entry.context.is_empty() {
        return base;
    }

    match serde_json::to_string(&entry.context) {
        Ok(context) => format!("{} {}", base, context),
        Err(_) => format!("{} {}", base, entry.context.format_fields()),
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json_obj = serde_json::Map::new();

    json_obj.insert(
        "datetime".to_string(),
        serde_json::Value::String(entry.timestamp.format(DATETIME_FORMAT).to_string()),
    );
    json_obj.insert(
        "level".to_string(),
        serde_json::Value::String(entry.level.to_str().to_string()),
    );
    json_obj.insert(
        "message".to_string(),
        serde_json::Value::String(interpolate(&entry.message, &entry.context)),
    );
    json_obj.insert("context".to_string(), entry.context.to_json_value());

    serde_json::to_string(&serde_json::Value::Object(json_obj)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_level::LogLevel;

    #[test]
    fn test_interpolate() {
        let context = LogContext::new()
            .with_field("signature", "~clean")
            .with_field("exec_time", 356);

        assert_eq!(
            interpolate("Request {signature} done in {exec_time} miliseconds", &context),
            "Request ~clean done in 356 miliseconds"
        );
    }

    #[test]
    fn test_interpolate_leaves_unknown_placeholders() {
        let context = LogContext::new().with_field("a", 1);

        assert_eq!(interpolate("{a} {b} {", &context), "1 {b} {");
        assert_eq!(interpolate("{{a}}", &context), "{1}");
    }

    #[test]
    fn test_text_format() {
        let entry = LogEntry::new(LogLevel::Warning, "Disk at {percent}%")
            .with_context(LogContext::new().with_field("percent", 91));

        let line = OutputFormat::Text.format(&entry);

        assert!(line.starts_with('['));
        assert!(line.ends_with(r#"WARNING: Disk at 91% {"percent":91}"#), "{}", line);
    }

    #[test]
    fn test_text_format_without_context() {
        let entry = LogEntry::new(LogLevel::Info, "plain");
        assert!(OutputFormat::Text.format(&entry).ends_with("] INFO: plain"));
    }

    #[test]
    fn test_json_format() {
        let entry = LogEntry::new(LogLevel::Error, "failed {name}")
            .with_context(LogContext::new().with_field("name", "job"));

        let line = OutputFormat::Json.format(&entry);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["level"], "ERROR");
        assert_eq!(parsed["message"], "failed job");
        assert_eq!(parsed["context"]["name"], "job");
        assert_eq!(parsed["datetime"].as_str().map(str::len), Some(19));
    }
}
