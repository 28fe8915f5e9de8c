use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

/// Severity of a record, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
  Trace = 0,
  Debug = 1,
  #[default]
  Info = 2,
  Warn = 3,
  Error = 4,
  Critical = 5,
  Off = 6,
}

impl LogLevel {
  pub const ALL: [LogLevel; 7] = [
    LogLevel::Trace,
    LogLevel::Debug,
    LogLevel::Info,
    LogLevel::Warn,
    LogLevel::Error,
    LogLevel::Critical,
    LogLevel::Off,
  ];

  /// The name used in the configuration document.
  pub fn as_str(self) -> &'static str {
    match self {
      LogLevel::Trace => "trace",
      LogLevel::Debug => "debug",
      LogLevel::Info => "info",
      LogLevel::Warn => "warn",
      LogLevel::Error => "err",
      LogLevel::Critical => "critical",
      LogLevel::Off => "off",
    }
  }

  /// Rendered by `%l`.
  pub fn long_name(self) -> &'static str {
    match self {
      LogLevel::Trace => "trace",
      LogLevel::Debug => "debug",
      LogLevel::Info => "info",
      LogLevel::Warn => "warning",
      LogLevel::Error => "error",
      LogLevel::Critical => "critical",
      LogLevel::Off => "off",
    }
  }

  /// Rendered by `%L`.
  pub fn short_name(self) -> &'static str {
    match self {
      LogLevel::Trace => "T",
      LogLevel::Debug => "D",
      LogLevel::Info => "I",
      LogLevel::Warn => "W",
      LogLevel::Error => "E",
      LogLevel::Critical => "C",
      LogLevel::Off => "O",
    }
  }

  pub(crate) fn from_u8(value: u8) -> LogLevel {
    LogLevel::ALL
      .get(value as usize)
      .copied()
      .unwrap_or(LogLevel::Off)
  }
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LogLevel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "trace" => Ok(LogLevel::Trace),
      "debug" => Ok(LogLevel::Debug),
      "info" => Ok(LogLevel::Info),
      "warn" | "warning" => Ok(LogLevel::Warn),
      "err" | "error" => Ok(LogLevel::Error),
      "critical" => Ok(LogLevel::Critical),
      "off" => Ok(LogLevel::Off),
      other => Err(Error::InvalidParameter {
        field: "level".to_string(),
        message: format!("unknown level '{}'", other),
      }),
    }
  }
}

impl From<tracing::Level> for LogLevel {
  fn from(level: tracing::Level) -> Self {
    match level {
      tracing::Level::TRACE => LogLevel::Trace,
      tracing::Level::DEBUG => LogLevel::Debug,
      tracing::Level::INFO => LogLevel::Info,
      tracing::Level::WARN => LogLevel::Warn,
      _ => LogLevel::Error,
    }
  }
}

impl From<log::Level> for LogLevel {
  fn from(level: log::Level) -> Self {
    match level {
      log::Level::Trace => LogLevel::Trace,
      log::Level::Debug => LogLevel::Debug,
      log::Level::Info => LogLevel::Info,
      log::Level::Warn => LogLevel::Warn,
      log::Level::Error => LogLevel::Error,
    }
  }
}

/// Call-site of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
  pub file: String,
  pub line: u32,
  pub function: Option<String>,
}

impl SourceLocation {
  pub fn new(file: impl Into<String>, line: u32) -> Self {
    Self {
      file: file.into(),
      line,
      function: None,
    }
  }

  /// Location of the caller of the `#[track_caller]` function invoking this.
  #[track_caller]
  pub fn caller() -> Self {
    let location = std::panic::Location::caller();
    Self::new(location.file(), location.line())
  }

  /// File name without its directories, as rendered by `%s`.
  pub fn short_file(&self) -> &str {
    self
      .file
      .rsplit(['/', '\\'])
      .next()
      .unwrap_or(&self.file)
  }
}

/// One log message on its way from a logger to its sinks.
#[derive(Debug, Clone)]
pub struct LogRecord {
  pub timestamp: DateTime<Local>,
  pub level: LogLevel,
  pub logger_name: String,
  pub message: String,
  pub location: Option<SourceLocation>,
  pub thread_id: String,
  pub thread_name: Option<String>,
}

impl LogRecord {
  /// Creates a record stamped with the current time and thread.
  pub fn new<S1, S2>(level: LogLevel, logger_name: S1, message: S2) -> Self
  where
    S1: Into<String>,
    S2: Into<String>,
  {
    let current_thread = std::thread::current();
    LogRecord {
      timestamp: Local::now(),
      level,
      logger_name: logger_name.into(),
      message: message.into(),
      location: None,
      thread_id: current_thread_id(),
      thread_name: current_thread.name().map(str::to_string),
    }
  }

  pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
    self.location = location;
    self
  }
}

/// Numeric id of the current thread, extracted from the `Debug` output of `ThreadId`.
pub(crate) fn current_thread_id() -> String {
  let debug_id = format!("{:?}", std::thread::current().id());
  debug_id
    .strip_prefix("ThreadId(")
    .and_then(|s| s.strip_suffix(')'))
    .unwrap_or(&debug_id)
    .to_string()
}
