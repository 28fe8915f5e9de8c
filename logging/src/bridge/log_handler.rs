use super::deliver;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord, SourceLocation};
use crate::registry::Registry;
use log::{LevelFilter, Metadata, Record};

/// A `log::Log` implementation forwarding records to a Registry.
///
/// Records go to the logger named like their target, or to `MAIN`.
pub struct LogBridge {
  registry: &'static Registry,
}

impl LogBridge {
  pub fn new(registry: &'static Registry) -> Self {
    Self { registry }
  }

  fn build_record(record: &Record<'_>) -> LogRecord {
    let location = record.file().map(|file| SourceLocation {
      file: file.to_string(),
      line: record.line().unwrap_or(0),
      function: record.module_path().map(str::to_string),
    });
    LogRecord::new(
      LogLevel::from(record.level()),
      record.target(),
      record.args().to_string(),
    )
    .with_location(location)
  }
}

impl log::Log for LogBridge {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }
    deliver(self.registry, record.target(), Self::build_record(record));
  }

  fn flush(&self) {
    if let Err(e) = self.registry.flush_all() {
      eprintln!("[unilog:ERROR] Flushing from the log bridge failed: {}", e);
    }
  }
}

/// Installs a [`LogBridge`] over `registry` as the global `log` logger.
pub fn install_log_bridge(registry: &'static Registry, max_level: LevelFilter) -> Result<()> {
  log::set_boxed_logger(Box::new(LogBridge::new(registry)))
    .map_err(|e| Error::LogBridgeInit(e.to_string()))?;
  log::set_max_level(max_level);
  Ok(())
}
