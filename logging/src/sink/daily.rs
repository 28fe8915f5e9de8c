use super::file::open_append;
use super::rotate_daily::next_rotation_after;
use super::{ensure_parent_dir, Sink, SinkLevel};
use crate::encoders::FormattedRecord;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord};
use chrono::{DateTime, Local, NaiveDate};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// `dir/app.log` on 2024-03-01 becomes `dir/app_2024-03-01.log`.
pub(crate) fn dated_filename(base: &Path, date: NaiveDate) -> PathBuf {
  let stem = base
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_default();
  let name = match base.extension() {
    Some(ext) => format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), ext.to_string_lossy()),
    None => format!("{}_{}", stem, date.format("%Y-%m-%d")),
  };
  base.with_file_name(name)
}

struct DailyState {
  writer: BufWriter<File>,
  next_rotation: DateTime<Local>,
  files: VecDeque<PathBuf>,
}

/// One file per day, switching at the configured time of day.
pub struct DailyFileSink {
  name: String,
  base_path: PathBuf,
  rotation_hour: u32,
  rotation_minute: u32,
  max_files: usize,
  level: SinkLevel,
  state: Mutex<DailyState>,
}

impl DailyFileSink {
  pub fn new(
    name: &str,
    base_path: &Path,
    rotation_hour: u32,
    rotation_minute: u32,
    max_files: usize,
  ) -> Result<Self> {
    Self::new_at(name, base_path, rotation_hour, rotation_minute, max_files, Local::now())
  }

  /// Testable constructor that allows injecting the current time.
  pub(crate) fn new_at(
    name: &str,
    base_path: &Path,
    rotation_hour: u32,
    rotation_minute: u32,
    max_files: usize,
    now: DateTime<Local>,
  ) -> Result<Self> {
    if rotation_hour > 23 || rotation_minute > 59 {
      return Err(Error::InvalidParameter {
        field: "rotation".to_string(),
        message: format!(
          "sink '{}' rotation time {}:{} is outside 0..=23:0..=59",
          name, rotation_hour, rotation_minute
        ),
      });
    }
    ensure_parent_dir(name, base_path)?;

    // Collect what previous runs left behind, oldest first.
    let mut files = VecDeque::new();
    if max_files > 0 {
      let mut date = now.date_naive();
      for _ in 1..max_files {
        date = match date.pred_opt() {
          Some(d) => d,
          None => break,
        };
        let path = dated_filename(base_path, date);
        if path.exists() {
          files.push_front(path);
        }
      }
    }

    let current = dated_filename(base_path, now.date_naive());
    let (writer, _) = open_append(name, &current)?;
    files.push_back(current);

    Ok(Self {
      name: name.to_string(),
      base_path: base_path.to_path_buf(),
      rotation_hour,
      rotation_minute,
      max_files,
      level: SinkLevel::new(LogLevel::Trace),
      state: Mutex::new(DailyState {
        writer,
        next_rotation: next_rotation_after(now, rotation_hour, rotation_minute),
        files,
      }),
    })
  }

  pub(crate) fn write_at(&self, bytes: &[u8], now: DateTime<Local>) -> Result<()> {
    let mut state = self.state.lock();
    if now >= state.next_rotation {
      state.writer.flush()?;
      let path = dated_filename(&self.base_path, now.date_naive());
      let (writer, _) = open_append(&self.name, &path)?;
      state.writer = writer;
      state.next_rotation = next_rotation_after(now, self.rotation_hour, self.rotation_minute);
      if state.files.back() != Some(&path) {
        state.files.push_back(path);
      }
      while self.max_files > 0 && state.files.len() > self.max_files {
        if let Some(old) = state.files.pop_front() {
          match fs::remove_file(&old) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(Error::RetentionIo { path: old, source }),
          }
        }
      }
    }
    state.writer.write_all(bytes)?;
    Ok(())
  }
}

impl Sink for DailyFileSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn log(&self, record: &LogRecord, formatted: &FormattedRecord) -> Result<()> {
    self.write_at(&formatted.bytes, record.timestamp)
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
