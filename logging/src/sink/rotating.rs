use super::file::open_append;
use super::{ensure_parent_dir, Sink, SinkLevel};
use crate::encoders::FormattedRecord;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `dir/app.log` with index 2 becomes `dir/app.2.log`. Index 0 is the base file.
pub(crate) fn indexed_filename(base: &Path, index: usize) -> PathBuf {
  if index == 0 {
    return base.to_path_buf();
  }
  let stem = base
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let name = match base.extension() {
    Some(ext) => format!("{}.{}.{}", stem, index, ext.to_string_lossy()),
    None => format!("{}.{}", stem, index),
  };
  base.with_file_name(name)
}

struct RotatingState {
  writer: BufWriter<File>,
  current_size: u64,
}

/// Rotates by size: `app.log` shifts to `app.1.log`, which shifts to `app.2.log`,
/// up to `max_files` rotated copies.
pub struct RotatingFileSink {
  name: String,
  base_path: PathBuf,
  max_size: u64,
  max_files: usize,
  level: SinkLevel,
  state: Mutex<RotatingState>,
}

impl RotatingFileSink {
  pub fn new(name: &str, base_path: &Path, max_size: u64, max_files: usize) -> Result<Self> {
    if max_size == 0 {
      return Err(Error::InvalidParameter {
        field: "max_size".to_string(),
        message: format!("sink '{}' needs a maximum size above zero", name),
      });
    }
    ensure_parent_dir(name, base_path)?;
    let (writer, current_size) = open_append(name, base_path)?;
    Ok(Self {
      name: name.to_string(),
      base_path: base_path.to_path_buf(),
      max_size,
      max_files,
      level: SinkLevel::new(LogLevel::Trace),
      state: Mutex::new(RotatingState {
        writer,
        current_size,
      }),
    })
  }

  /// Shifts every copy up by one index and starts an empty base file.
  fn rotate(&self, state: &mut RotatingState) -> Result<()> {
    state.writer.flush()?;
    for index in (1..=self.max_files).rev() {
      let source = indexed_filename(&self.base_path, index - 1);
      let target = indexed_filename(&self.base_path, index);
      if !source.exists() {
        continue;
      }
      match fs::remove_file(&target) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => {
          return Err(Error::RetentionIo {
            path: target,
            source,
          })
        }
      }
      fs::rename(&source, &target)?;
    }
    let file = File::create(&self.base_path)?;
    state.writer = BufWriter::new(file);
    state.current_size = 0;
    Ok(())
  }
}

impl Sink for RotatingFileSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn log(&self, _record: &LogRecord, formatted: &FormattedRecord) -> Result<()> {
    let mut state = self.state.lock();
    let incoming = formatted.len() as u64;
    if state.current_size > 0 && state.current_size + incoming > self.max_size {
      self.rotate(&mut state)?;
    }
    state.writer.write_all(&formatted.bytes)?;
    state.current_size += incoming;
    Ok(())
  }

  fn flush(&self) -> Result<()> {
    self.state.lock().writer.flush()?;
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
  use tempfile::tempdir;

  fn list_files(dir: &Path) -> Vec<String> {
    let mut files = fs::read_dir(dir)
      .unwrap()
      .map(|res| res.unwrap().file_name().into_string().unwrap())
      .collect::<Vec<String>>();
    files.sort();
    files
  }

  fn write(sink: &RotatingFileSink, text: &str) {
    let record = LogRecord::new(LogLevel::Info, "app", text);
    let formatted = FormattedRecord {
      bytes: text.as_bytes().to_vec(),
      color_range: None,
    };
    sink.log(&record, &formatted).unwrap();
    sink.flush().unwrap();
  }

  #[test]
  fn indexed_names() {
    let base = Path::new("/var/log/app.log");
    assert_eq!(indexed_filename(base, 0), PathBuf::from("/var/log/app.log"));
    assert_eq!(indexed_filename(base, 3), PathBuf::from("/var/log/app.3.log"));
    assert_eq!(
      indexed_filename(Path::new("/var/log/app"), 1),
      PathBuf::from("/var/log/app.1")
    );
  }

  #[test]
  fn test_size_based_roll() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path().join("app.log");
    let sink = RotatingFileSink::new("app", &base, 10, 2).unwrap();

    write(&sink, "12345678");
    assert_eq!(list_files(temp_dir.path()), vec!["app.log"]);

    // 8 + 8 > 10, so the second write lands in a fresh file.
    write(&sink, "abcdefgh");
    assert_eq!(list_files(temp_dir.path()), vec!["app.1.log", "app.log"]);
    assert_eq!(fs::read_to_string(temp_dir.path().join("app.1.log")).unwrap(), "12345678");
    assert_eq!(fs::read_to_string(&base).unwrap(), "abcdefgh");
  }

  #[test]
  fn test_retention_keeps_max_files_copies() {
    let temp_dir = tempdir().unwrap();
    let base = temp_dir.path().join("app.log");
    let sink = RotatingFileSink::new("app", &base, 10, 2).unwrap();

    for i in 0..5 {
      write(&sink, &format!("message {}", i));
    }

    assert_eq!(
      list_files(temp_dir.path()),
      vec!["app.1.log", "app.2.log", "app.log"]
    );
    assert_eq!(fs::read_to_string(&base).unwrap(), "message 4");
    assert_eq!(fs::read_to_string(temp_dir.path().join("app.2.log")).unwrap(), "message 2");
  }
}
