// Named loggers: a level, a pattern and an ordered list of sinks.

use crate::config::entity::DeliveryMode;
use crate::encoders::{new_record_formatter, RecordFormatter};
use crate::error::Result;
use crate::model::{LogLevel, LogRecord, SourceLocation};
use crate::sink::Sink;
use crate::thread_pool::{FlushSignal, Inbox, Job, OverflowPolicy, ThreadPool};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// The part of a logger that workers need to deliver its records.
pub(crate) struct LoggerCore {
  name: String,
  sinks: Vec<Arc<dyn Sink>>,
  formatter: RwLock<Arc<dyn RecordFormatter>>,
  level: AtomicU8,
  flush_level: AtomicU8,
  pub(crate) inbox: Mutex<Inbox>,
}

impl LoggerCore {
  pub(crate) fn name(&self) -> &str {
    &self.name
  }

  /// Formats once and writes to every sink accepting the level.
  ///
  /// A failing sink does not stop the others; the first error is returned.
  pub(crate) fn sink_it(&self, record: &LogRecord) -> Result<()> {
    let formatter = Arc::clone(&self.formatter.read());
    let formatted = formatter.format_record(record);

    let mut first_error = None;
    for sink in &self.sinks {
      if sink.should_log(record.level) {
        if let Err(e) = sink.log(record, &formatted) {
          first_error.get_or_insert(e);
        }
      }
    }

    let flush_level = LogLevel::from_u8(self.flush_level.load(Ordering::Relaxed));
    if flush_level != LogLevel::Off && record.level >= flush_level {
      if let Err(e) = self.flush_sinks() {
        first_error.get_or_insert(e);
      }
    }

    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  pub(crate) fn flush_sinks(&self) -> Result<()> {
    let mut first_error = None;
    for sink in &self.sinks {
      if let Err(e) = sink.flush() {
        first_error.get_or_insert(e);
      }
    }
    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }
}

/// How a logger reaches its sinks.
#[derive(Clone)]
pub enum Delivery {
  /// The calling thread writes to the sinks.
  Sync,
  /// Records are queued on a shared pool.
  Async {
    pool: Arc<ThreadPool>,
    policy: OverflowPolicy,
  },
}

pub struct Logger {
  core: Arc<LoggerCore>,
  delivery: Delivery,
}

impl fmt::Debug for Logger {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Logger")
      .field("name", &self.core.name)
      .field("level", &self.level())
      .field("mode", &self.mode())
      .field("sinks", &self.sink_names())
      .finish()
  }
}

impl Logger {
  /// A logger at level `info` with the given pattern.
  pub fn new(name: &str, sinks: Vec<Arc<dyn Sink>>, pattern: &str, delivery: Delivery) -> Self {
    Self {
      core: Arc::new(LoggerCore {
        name: name.to_string(),
        sinks,
        formatter: RwLock::new(new_record_formatter(pattern)),
        level: AtomicU8::new(LogLevel::Info as u8),
        flush_level: AtomicU8::new(LogLevel::Off as u8),
        inbox: Mutex::new(Inbox::default()),
      }),
      delivery,
    }
  }

  /// Builds the delivery for a configured mode, using `pool` for the async ones.
  pub fn delivery_for(mode: DeliveryMode, pool: &Arc<ThreadPool>) -> Delivery {
    match mode {
      DeliveryMode::Sync => Delivery::Sync,
      DeliveryMode::Async => Delivery::Async {
        pool: Arc::clone(pool),
        policy: OverflowPolicy::Block,
      },
      DeliveryMode::AsyncNb => Delivery::Async {
        pool: Arc::clone(pool),
        policy: OverflowPolicy::OverrunOldest,
      },
    }
  }

  pub fn name(&self) -> &str {
    &self.core.name
  }

  pub fn mode(&self) -> DeliveryMode {
    match &self.delivery {
      Delivery::Sync => DeliveryMode::Sync,
      Delivery::Async {
        policy: OverflowPolicy::Block,
        ..
      } => DeliveryMode::Async,
      Delivery::Async {
        policy: OverflowPolicy::OverrunOldest,
        ..
      } => DeliveryMode::AsyncNb,
    }
  }

  pub fn sinks(&self) -> &[Arc<dyn Sink>] {
    &self.core.sinks
  }

  pub fn sink_names(&self) -> Vec<String> {
    self.core.sinks.iter().map(|s| s.name().to_string()).collect()
  }

  pub fn level(&self) -> LogLevel {
    LogLevel::from_u8(self.core.level.load(Ordering::Relaxed))
  }

  pub fn set_level(&self, level: LogLevel) {
    self.core.level.store(level as u8, Ordering::Relaxed);
  }

  /// Records at or above `level` flush every sink after being written.
  pub fn flush_on(&self, level: LogLevel) {
    self.core.flush_level.store(level as u8, Ordering::Relaxed);
  }

  pub fn flush_level(&self) -> LogLevel {
    LogLevel::from_u8(self.core.flush_level.load(Ordering::Relaxed))
  }

  pub fn set_pattern(&self, pattern: &str) {
    *self.core.formatter.write() = new_record_formatter(pattern);
  }

  pub fn set_formatter(&self, formatter: Arc<dyn RecordFormatter>) {
    *self.core.formatter.write() = formatter;
  }

  pub fn should_log(&self, level: LogLevel) -> bool {
    level != LogLevel::Off && level >= self.level()
  }

  #[track_caller]
  pub fn log(&self, level: LogLevel, message: impl Into<String>) -> Result<()> {
    self.log_at(level, message, Some(SourceLocation::caller()))
  }

  pub fn log_at(
    &self,
    level: LogLevel,
    message: impl Into<String>,
    location: Option<SourceLocation>,
  ) -> Result<()> {
    if !self.should_log(level) {
      return Ok(());
    }
    let record = LogRecord::new(level, self.core.name.as_str(), message).with_location(location);
    self.log_record(record)
  }

  /// Delivers a prepared record. The record's own timestamp drives file rotation.
  ///
  /// Synchronous loggers return sink errors, including failed retention
  /// deletes. Asynchronous loggers only fail when the pool is shut down.
  pub fn log_record(&self, record: LogRecord) -> Result<()> {
    if !self.should_log(record.level) {
      return Ok(());
    }
    match &self.delivery {
      Delivery::Sync => self.core.sink_it(&record),
      Delivery::Async { pool, policy } => {
        pool.post(Arc::clone(&self.core), Job::Log(record), *policy)
      }
    }
  }

  #[track_caller]
  pub fn trace(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Trace, message, Some(SourceLocation::caller()))
  }

  #[track_caller]
  pub fn debug(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Debug, message, Some(SourceLocation::caller()))
  }

  #[track_caller]
  pub fn info(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Info, message, Some(SourceLocation::caller()))
  }

  #[track_caller]
  pub fn warn(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Warn, message, Some(SourceLocation::caller()))
  }

  #[track_caller]
  pub fn error(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Error, message, Some(SourceLocation::caller()))
  }

  #[track_caller]
  pub fn critical(&self, message: impl Into<String>) -> Result<()> {
    self.log_at(LogLevel::Critical, message, Some(SourceLocation::caller()))
  }

  /// Flushes every sink. For async loggers this waits until everything
  /// queued before the call has been written.
  pub fn flush(&self) -> Result<()> {
    match &self.delivery {
      Delivery::Sync => self.core.flush_sinks(),
      Delivery::Async { pool, .. } => {
        let signal = Arc::new(FlushSignal::default());
        pool.post(
          Arc::clone(&self.core),
          Job::Flush(Some(Arc::clone(&signal))),
          OverflowPolicy::Block,
        )?;
        signal.wait();
        Ok(())
      }
    }
  }

  /// Flushes the sinks from the calling thread, bypassing the pool.
  pub(crate) fn flush_sinks_now(&self) -> Result<()> {
    self.core.flush_sinks()
  }
}
