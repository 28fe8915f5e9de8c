use super::{ensure_parent_dir, Sink, SinkLevel};
use crate::encoders::FormattedRecord;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Opens `path` for appending, creating it if necessary, and returns its current size.
pub(crate) fn open_append(sink_name: &str, path: &Path) -> Result<(BufWriter<File>, u64)> {
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .map_err(|e| Error::SinkSetup {
      sink_name: sink_name.to_string(),
      reason: format!("Failed to open log file {:?}: {}", path, e),
    })?;
  let current_size = file.metadata()?.len();
  Ok((BufWriter::new(file), current_size))
}

/// A single, never rotated file.
pub struct BasicFileSink {
  name: String,
  path: PathBuf,
  level: SinkLevel,
  writer: Mutex<BufWriter<File>>,
}

impl BasicFileSink {
  pub fn new(name: &str, path: &Path) -> Result<Self> {
    ensure_parent_dir(name, path)?;
    let (writer, _) = open_append(name, path)?;
    Ok(Self {
      name: name.to_string(),
      path: path.to_path_buf(),
      level: SinkLevel::new(LogLevel::Trace),
      writer: Mutex::new(writer),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Sink for BasicFileSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn log(&self, _record: &LogRecord, formatted: &FormattedRecord) -> Result<()> {
    self.writer.lock().write_all(&formatted.bytes)?;
    Ok(())
  }

  fn flush(&self) -> Result<()> {
    self.writer.lock().flush()?;
    Ok(())
  }

  fn level(&self) -> LogLevel {
    self.level.get()
  }

  fn set_level(&self, level: LogLevel) {
    self.level.set(level)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::tempdir;

  fn formatted(text: &str) -> FormattedRecord {
    FormattedRecord {
      bytes: text.as_bytes().to_vec(),
      color_range: None,
    }
  }

  #[test]
  fn appends_and_creates_directories() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("nested").join("app.log");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "existing\n").unwrap();

    let sink = BasicFileSink::new("app", &path).unwrap();
    let record = LogRecord::new(LogLevel::Info, "app", "ignored");
    sink.log(&record, &formatted("first\n")).unwrap();
    sink.log(&record, &formatted("second\n")).unwrap();
    sink.flush().unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nfirst\nsecond\n");
  }

  #[test]
  fn missing_directory_is_created() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("a").join("b").join("app.log");
    let sink = BasicFileSink::new("app", &path).unwrap();
    assert!(sink.path().exists());
  }
}
