// Concrete output destinations and the mapping from SinkSpec to them.

use crate::config::entity::{SinkFamily, SinkSpec};
use crate::encoders::FormattedRecord;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub mod console;
pub mod daily;
pub mod file;
pub mod rotate_daily;
pub mod rotating;

pub use console::ConsoleSink;
pub use daily::DailyFileSink;
pub use file::BasicFileSink;
pub use rotate_daily::RotateDailyFileSink;
pub use rotating::RotatingFileSink;

/// A single output destination.
///
/// Every implementation serializes its own writes, rotation checks and
/// evictions, so one sink may be shared by several loggers and threads.
pub trait Sink: Send + Sync + 'static {
  fn name(&self) -> &str;

  /// Writes one already formatted record.
  fn log(&self, record: &LogRecord, formatted: &FormattedRecord) -> Result<()>;

  fn flush(&self) -> Result<()>;

  fn level(&self) -> LogLevel;

  fn set_level(&self, level: LogLevel);

  fn should_log(&self, level: LogLevel) -> bool {
    level != LogLevel::Off && level >= self.level()
  }
}

/// Minimum level of a sink, adjustable through a shared reference.
#[derive(Debug)]
pub(crate) struct SinkLevel(AtomicU8);

impl SinkLevel {
  pub(crate) fn new(level: LogLevel) -> Self {
    Self(AtomicU8::new(level as u8))
  }

  pub(crate) fn get(&self) -> LogLevel {
    LogLevel::from_u8(self.0.load(Ordering::Relaxed))
  }

  pub(crate) fn set(&self, level: LogLevel) {
    self.0.store(level as u8, Ordering::Relaxed);
  }
}

/// Creates the parent directory of a log file.
pub(crate) fn ensure_parent_dir(sink_name: &str, path: &Path) -> Result<()> {
  match path.parent().filter(|p| !p.as_os_str().is_empty()) {
    Some(parent) => fs::create_dir_all(parent).map_err(|e| Error::SinkSetup {
      sink_name: sink_name.to_string(),
      reason: format!("Failed to create directory {:?}: {}", parent, e),
    }),
    None => Ok(()),
  }
}

fn required_path(spec: &SinkSpec) -> Result<std::path::PathBuf> {
  spec.file_path().ok_or_else(|| Error::SinkSetup {
    sink_name: spec.name().to_string(),
    reason: "file sink without a file name".to_string(),
  })
}

/// Builds the concrete sink for a spec. The sink starts at the spec's level.
///
/// Single-threaded variants get the same internal lock as the multi-threaded
/// ones, since a registry sink can always be reached from several threads.
pub fn build_sink(spec: &SinkSpec) -> Result<Arc<dyn Sink>> {
  let sink_type = spec.sink_type();
  let sink: Arc<dyn Sink> = match sink_type.family() {
    SinkFamily::Console | SinkFamily::ConsoleColor => {
      let stream = sink_type.console_stream().ok_or_else(|| Error::SinkSetup {
        sink_name: spec.name().to_string(),
        reason: format!("'{}' has no console stream", sink_type),
      })?;
      Arc::new(ConsoleSink::new(
        spec.name(),
        stream,
        sink_type.family() == SinkFamily::ConsoleColor,
      ))
    }
    SinkFamily::FileBasic => Arc::new(BasicFileSink::new(spec.name(), &required_path(spec)?)?),
    SinkFamily::FileDaily => Arc::new(DailyFileSink::new(
      spec.name(),
      &required_path(spec)?,
      spec.rotation_hour().unwrap_or(0),
      spec.rotation_minute().unwrap_or(0),
      spec.max_files().unwrap_or(0) as usize,
    )?),
    SinkFamily::FileRotatingBySize => Arc::new(RotatingFileSink::new(
      spec.name(),
      &required_path(spec)?,
      spec.max_size().unwrap_or(0),
      spec.max_files().unwrap_or(0) as usize,
    )?),
    SinkFamily::FileRotatingDaily => Arc::new(RotateDailyFileSink::new(
      spec.name(),
      &required_path(spec)?,
      spec.rotation_hour().unwrap_or(0),
      spec.rotation_minute().unwrap_or(0),
      spec.max_size().unwrap_or(0),
      spec.max_files().unwrap_or(0) as usize,
    )?),
  };
  sink.set_level(spec.level());
  Ok(sink)
}
