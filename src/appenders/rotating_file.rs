//! Daily rotating file appender
//!
//! Writes to `<stem>-YYYY-MM-DD.<ext>` next to the configured base path,
//! opens a new file when the date changes and keeps at most `max_files`
//! dated files.

use crate::core::appender::Appender;
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::LogEntry;
use crate::core::output_format::OutputFormat;
use chrono::{NaiveDate, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily rotating file appender
///
/// # Examples
///
/// ```no_run
/// use request_logger::appenders::RotatingFileAppender;
/// use request_logger::OutputFormat;
///
/// // Keep a week of files, one JSON object per line
/// let appender = RotatingFileAppender::new("/var/log/tracker/log.txt")
///     .unwrap()
///     .with_max_files(7)
///     .with_format(OutputFormat::Json);
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    /// Number of dated files to keep, 0 keeps all
    max_files: usize,
    permissions: Option<u32>,
    use_locking: bool,
    format: OutputFormat,
    current_date: NaiveDate,
    current_path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl RotatingFileAppender {
    /// Create a rotating appender for `path`
    ///
    /// # Errors
    ///
    /// Returns error if the directory or today's file cannot be created
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let today = Utc::now().date_naive();
        let mut appender = Self {
            current_path: dated_path(&base_path, today),
            base_path,
            max_files: 0,
            permissions: None,
            use_locking: false,
            format: OutputFormat::default(),
            current_date: today,
            writer: None,
        };
        appender.open_current()?;

        Ok(appender)
    }

    /// Keep at most `max_files` dated files (0 keeps all)
    #[must_use]
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self.cleanup();
        self
    }

    /// Unix permission bits applied to newly created files
    #[must_use]
    pub fn with_permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self.apply_permissions();
        self
    }

    /// Take an exclusive file lock around every write
    #[must_use]
    pub fn with_locking(mut self, enabled: bool) -> Self {
        self.use_locking = enabled;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// File currently written to
    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn max_files(&self) -> usize {
        self.max_files
    }

    fn open_current(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.current_path)
            .map_err(|e| {
                LoggerError::file_appender(
                    self.current_path.display().to_string(),
                    format!("Failed to open: {}", e),
                )
            })?;

        self.writer = Some(BufWriter::new(file));
        self.apply_permissions();
        self.cleanup();
        Ok(())
    }

    /// Switch to the file for `date`
    fn rotate(&mut self, date: NaiveDate) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.current_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        self.current_date = date;
        self.current_path = dated_path(&self.base_path, date);
        self.open_current()
    }

    #[cfg(unix)]
    fn apply_permissions(&self) {
        use std::os::unix::fs::PermissionsExt;

        if let Some(mode) = self.permissions {
            if let Err(e) = fs::set_permissions(&self.current_path, fs::Permissions::from_mode(mode)) {
                eprintln!(
                    "[LOGGER WARNING] Failed to set permissions {:o} on {}: {}",
                    mode,
                    self.current_path.display(),
                    e
                );
            }
        }
    }

    #[cfg(not(unix))]
    fn apply_permissions(&self) {}

    /// Remove dated files beyond `max_files`, newest first
    fn cleanup(&self) {
        if self.max_files == 0 {
            return;
        }

        let mut dated = self.dated_files();
        if dated.len() <= self.max_files {
            return;
        }

        dated.sort_by(|a, b| b.0.cmp(&a.0));
        for (_, path) in dated.into_iter().skip(self.max_files) {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove old log file {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }

    /// Files next to the base path that follow the dated naming scheme
    fn dated_files(&self) -> Vec<(NaiveDate, PathBuf)> {
        let dir = match self.base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => dir.to_path_buf(),
            None => PathBuf::from("."),
        };
        let (stem, extension) = split_file_name(&self.base_path);
        let prefix = format!("{}-", stem);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!(
                    "[LOGGER WARNING] Failed to list log directory {}: {}",
                    dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().into_string().ok()?;
                let rest = name.strip_prefix(&prefix)?;
                let date = match &extension {
                    Some(ext) => rest.strip_suffix(ext.as_str())?.strip_suffix('.')?,
                    None => rest,
                };
                let date = NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;
                Some((date, entry.path()))
            })
            .collect()
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if self.use_locking {
            return self.write_locked(line);
        }

        let path = self.current_path.display().to_string();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;

        writer.write_all(line).map_err(|e| {
            LoggerError::file_appender(path, format!("Failed to write log entry: {}", e))
        })
    }

    /// Write and flush `line` while holding an exclusive lock on the file
    #[cfg(feature = "file")]
    fn write_locked(&mut self, line: &[u8]) -> Result<()> {
        use fs2::FileExt;

        let path = self.current_path.display().to_string();
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;

        FileExt::lock_exclusive(writer.get_ref())
            .map_err(|e| LoggerError::file_appender(&path, format!("Failed to lock: {}", e)))?;

        let written = writer.write_all(line).and_then(|_| writer.flush());
        let unlocked = FileExt::unlock(writer.get_ref());

        written.map_err(|e| {
            LoggerError::file_appender(&path, format!("Failed to write log entry: {}", e))
        })?;
        unlocked.map_err(|e| LoggerError::file_appender(&path, format!("Failed to unlock: {}", e)))
    }

    #[cfg(not(feature = "file"))]
    fn write_locked(&mut self, line: &[u8]) -> Result<()> {
        self.use_locking = false;
        eprintln!("[LOGGER WARNING] File locking requires the `file` feature; writing unlocked");
        self.write_line(line)
    }
}

/// `<stem>-<date>.<ext>` in the directory of `base`
fn dated_path(base: &Path, date: NaiveDate) -> PathBuf {
    let (stem, extension) = split_file_name(base);
    let date = date.format(DATE_FORMAT);

    let file_name = match extension {
        Some(ext) => format!("{}-{}.{}", stem, date, ext),
        None => format!("{}-{}", stem, date),
    };
    base.with_file_name(file_name)
}

fn split_file_name(base: &Path) -> (String, Option<String>) {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("log")
        .to_string();
    let extension = base
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string);
    (stem, extension)
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating_file"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let today = Utc::now().date_naive();
        if today != self.current_date {
            if let Err(e) = self.rotate(today) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );
                if self.writer.is_none() {
                    return Err(e);
                }
            }
        }

        let mut line = self.format.format(entry);
        line.push('\n');

        self.write_line(line.as_bytes())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.current_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_context::LogContext;
    use crate::core::log_level::LogLevel;
    use tempfile::tempdir;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(LogLevel::Info, message)
            .with_context(LogContext::new().with_field("user_id", 7))
    }

    #[test]
    fn test_dated_path() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        assert_eq!(
            dated_path(Path::new("/var/log/log.txt"), date),
            PathBuf::from("/var/log/log-2024-03-09.txt")
        );
        assert_eq!(
            dated_path(Path::new("/var/log/tracker"), date),
            PathBuf::from("/var/log/tracker-2024-03-09")
        );
    }

    #[test]
    fn test_writes_to_todays_file() {
        let dir = tempdir().unwrap();
        let mut appender = RotatingFileAppender::new(dir.path().join("log.txt")).unwrap();

        appender.append(&entry("Hello {user_id}")).unwrap();
        appender.flush().unwrap();

        let expected = dated_path(&dir.path().join("log.txt"), Utc::now().date_naive());
        assert_eq!(appender.current_path(), expected);

        let content = fs::read_to_string(expected).unwrap();
        assert!(content.contains(r#"INFO: Hello 7 {"user_id":7}"#), "{}", content);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_json_lines() {
        let dir = tempdir().unwrap();
        let mut appender = RotatingFileAppender::new(dir.path().join("log.txt"))
            .unwrap()
            .with_format(OutputFormat::Json);

        appender.append(&entry("first")).unwrap();
        appender.append(&entry("second")).unwrap();
        appender.flush().unwrap();

        let content = fs::read_to_string(appender.current_path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["message"], "second");
        assert_eq!(lines[0]["context"]["user_id"], 7);
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempdir().unwrap();
        for day in 1..=5 {
            let date = NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
            fs::write(dated_path(&dir.path().join("log.txt"), date), "old\n").unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), "keep\n").unwrap();

        let appender = RotatingFileAppender::new(dir.path().join("log.txt"))
            .unwrap()
            .with_max_files(3);

        assert!(appender.current_path().exists());
        assert!(dir.path().join("log-2020-01-05.txt").exists());
        assert!(dir.path().join("log-2020-01-04.txt").exists());
        assert!(!dir.path().join("log-2020-01-03.txt").exists());
        assert!(!dir.path().join("log-2020-01-01.txt").exists());
        assert!(dir.path().join("unrelated.txt").exists());
    }

    #[test]
    fn test_zero_max_files_keeps_everything() {
        let dir = tempdir().unwrap();
        for day in 1..=3 {
            let date = NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
            fs::write(dated_path(&dir.path().join("log.txt"), date), "old\n").unwrap();
        }

        let appender = RotatingFileAppender::new(dir.path().join("log.txt")).unwrap();

        assert_eq!(appender.dated_files().len(), 4);
    }

    #[test]
    fn test_locked_writes() {
        let dir = tempdir().unwrap();
        let mut appender = RotatingFileAppender::new(dir.path().join("log.txt"))
            .unwrap()
            .with_locking(true);

        appender.append(&entry("locked")).unwrap();
        appender.flush().unwrap();

        let content = fs::read_to_string(appender.current_path()).unwrap();
        assert!(content.contains("locked"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let appender = RotatingFileAppender::new(dir.path().join("log.txt"))
            .unwrap()
            .with_permissions(0o600);

        let mode = fs::metadata(appender.current_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
