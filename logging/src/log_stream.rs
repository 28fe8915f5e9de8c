// Scoped message builders flushed to a named logger when they go out of scope.

use crate::config::entity::MAIN_LOGGER;
use crate::error::Result;
use crate::error_handling::{send_error_report, InternalErrorSource};
use crate::model::{LogLevel, SourceLocation};
use crate::registry::Registry;
use std::fmt::{self, Display, Write};

/// Collects text and submits it once, at the bound level and call site, to
/// the named logger (creating that logger if needed).
///
/// ```no_run
/// use std::fmt::Write;
///
/// unilog::init("config/log.json", "log");
/// let mut line = unilog::log_stream::info("net");
/// write!(line, "listening on port {}", 8080).unwrap();
/// drop(line);
/// unilog::shutdown();
/// ```
pub struct LogStream<'r> {
  registry: &'r Registry,
  logger_name: String,
  level: LogLevel,
  location: SourceLocation,
  prefix: String,
  buffer: String,
  submitted: bool,
}

impl LogStream<'static> {
  /// A stream on the process-wide registry.
  #[track_caller]
  pub fn new(logger_name: &str, level: LogLevel) -> Self {
    LogStream::with_registry(Registry::global(), logger_name, level)
  }
}

impl<'r> LogStream<'r> {
  #[track_caller]
  pub fn with_registry(registry: &'r Registry, logger_name: &str, level: LogLevel) -> Self {
    Self {
      registry,
      logger_name: logger_name.to_string(),
      level,
      location: SourceLocation::caller(),
      prefix: String::new(),
      buffer: String::new(),
      submitted: false,
    }
  }

  /// Text placed in front of everything written to the stream.
  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }

  /// Appends any displayable value.
  pub fn push(&mut self, value: impl Display) -> &mut Self {
    let _ = write!(self.buffer, "{}", value);
    self
  }

  pub fn logger_name(&self) -> &str {
    &self.logger_name
  }

  pub fn level(&self) -> LogLevel {
    self.level
  }

  /// Submits now and returns the outcome instead of reporting it on drop.
  pub fn finish(mut self) -> Result<()> {
    self.submit()
  }

  fn submit(&mut self) -> Result<()> {
    self.submitted = true;
    let mut message = std::mem::take(&mut self.prefix);
    message.push_str(&self.buffer);
    let logger = self.registry.get_logger(&self.logger_name)?;
    logger.log_at(self.level, message, Some(self.location.clone()))
  }
}

impl Write for LogStream<'_> {
  fn write_str(&mut self, s: &str) -> fmt::Result {
    self.buffer.push_str(s);
    Ok(())
  }
}

impl Drop for LogStream<'_> {
  fn drop(&mut self) {
    if self.submitted {
      return;
    }
    if let Err(e) = self.submit() {
      send_error_report(
        None,
        InternalErrorSource::LogStream {
          logger_name: self.logger_name.clone(),
        },
        e,
        Some(format!("{}:{}", self.location.file, self.location.line)),
      );
    }
  }
}

#[track_caller]
pub fn stream(logger_name: &str, level: LogLevel) -> LogStream<'static> {
  LogStream::new(logger_name, level)
}

#[track_caller]
pub fn trace(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Trace)
}

#[track_caller]
pub fn debug(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Debug)
}

#[track_caller]
pub fn info(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Info)
}

#[track_caller]
pub fn warn(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Warn)
}

#[track_caller]
pub fn error(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Error)
}

#[track_caller]
pub fn critical(logger_name: &str) -> LogStream<'static> {
  LogStream::new(logger_name, LogLevel::Critical)
}

/// A stream to the `MAIN` logger.
#[track_caller]
pub fn main(level: LogLevel) -> LogStream<'static> {
  LogStream::new(MAIN_LOGGER, level)
}
