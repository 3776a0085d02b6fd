//! Logging infrastructure for livecode.
//!
//! Provides a simple, thread-safe logging system with file output and
//! in-memory log storage. [`init`] also installs the logger as the `log`
//! crate backend, so library crates can use `log::debug!` and friends.
//! Logging before [`init`] is a silent no-op.

use chrono::Local;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Timestamp in HH:MM:SS format
    pub timestamp: String,
    /// Message level
    pub level: LogLevel,
    /// Message text
    pub message: String,
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert log level to string
    pub fn to_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// Logger state
#[derive(Debug)]
struct Logger {
    /// Recent messages (last N)
    entries: VecDeque<LogEntry>,
    /// Maximum number of entries in memory
    max_entries: usize,
    /// Minimum log level to record
    min_level: LogLevel,
    /// Log file path
    file_path: PathBuf,
}

impl Logger {
    /// Create new logger instance, truncating the log file
    fn new(file_path: PathBuf, max_entries: usize, min_level: LogLevel) -> Self {
        if let Some(parent) = file_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        if let Ok(mut file) = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
        {
            let _ = writeln!(file, "=== livecode log start ===");
        }

        Self {
            entries: VecDeque::new(),
            max_entries,
            min_level,
            file_path,
        }
    }

    fn add_entry(&mut self, level: LogLevel, message: String) {
        if level < self.min_level {
            return;
        }

        let timestamp = Local::now().format("%H:%M:%S").to_string();

        // Write to file (create if deleted)
        if let Ok(mut file) = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.file_path)
        {
            let _ = writeln!(file, "[{}] {}: {}", timestamp, level.to_str(), message);
        }

        self.entries.push_back(LogEntry {
            timestamp,
            level,
            message,
        });
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    fn get_entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Global logger instance that persists for the application lifetime.
static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Bridge from the `log` facade into the global logger
struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let level = LogLevel::from(metadata.level());
        with_logger(|logger| level >= logger.min_level).unwrap_or(false)
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format!("{}: {}", record.target(), record.args());
        with_logger(|logger| logger.add_entry(record.level().into(), message));
    }

    fn flush(&self) {}
}

/// Run `f` on the global logger if it has been initialized
fn with_logger<T>(f: impl FnOnce(&mut Logger) -> T) -> Option<T> {
    let mut logger = LOGGER.get()?.lock().ok()?;
    Some(f(&mut logger))
}

/// Initialize the global logger
///
/// Should be called once at application startup. Subsequent calls are
/// ignored. Messages logged before this are dropped.
///
/// # Arguments
///
/// * `file_path` - Path to the log file
/// * `max_entries` - Maximum number of log entries to keep in memory
/// * `min_level` - Minimum log level to record (Debug, Info, Warn, Error)
pub fn init(file_path: PathBuf, max_entries: usize, min_level: LogLevel) {
    LOGGER.get_or_init(|| Mutex::new(Logger::new(file_path, max_entries, min_level)));
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(min_level.to_filter());
    }
}

/// Whether [`init`] has run
pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

/// Get all log entries currently stored in memory
pub fn get_entries() -> Vec<LogEntry> {
    with_logger(|logger| logger.get_entries()).unwrap_or_default()
}

/// Most recent warning or error, if any
pub fn last_problem() -> Option<LogEntry> {
    with_logger(|logger| {
        logger
            .entries
            .iter()
            .rev()
            .find(|entry| entry.level >= LogLevel::Warn)
            .cloned()
    })
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_parsing() {
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("DEBUG".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Debug);
    }

    #[test]
    fn test_entries_are_filtered_and_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("test.log");
        let mut logger = Logger::new(path.clone(), 2, LogLevel::Info);

        logger.add_entry(LogLevel::Debug, "hidden".to_string());
        logger.add_entry(LogLevel::Info, "one".to_string());
        logger.add_entry(LogLevel::Warn, "two".to_string());
        logger.add_entry(LogLevel::Error, "three".to_string());

        let messages: Vec<String> = logger.get_entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, ["two", "three"]);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("=== livecode log start ==="));
        assert!(content.contains("INFO: one"));
        assert!(!content.contains("hidden"));
    }

    #[test]
    fn test_global_logging_and_bridge() {
        // Logging before init must not panic
        if !is_initialized() {
            log::info!("dropped");
            assert!(get_entries().is_empty());
            assert!(last_problem().is_none());
        }

        let dir = TempDir::new().unwrap();
        init(dir.path().join("global.log"), 100, LogLevel::Debug);
        assert!(is_initialized());

        log::warn!(target: "config", "bad chord");
        log::info!(target: "editor", "bridged {}", 42);

        let messages: Vec<String> = get_entries().into_iter().map(|e| e.message).collect();
        assert!(messages.iter().any(|m| m == "editor: bridged 42"));
        let problem = last_problem().unwrap();
        assert_eq!(problem.level, LogLevel::Warn);
        assert_eq!(problem.message, "config: bad chord");
    }
}
