// The daily + size rotating file sink with bounded retention.
//
// Files are named `YYYYMMDD-HHMMSS-<file name>` inside the directory of the
// configured path, the timestamp being the moment the file was started.

use super::file::open_append;
use super::{ensure_parent_dir, Sink, SinkLevel};
use crate::encoders::FormattedRecord;
use crate::error::{Error, Result};
use crate::model::{LogLevel, LogRecord};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// A file left by this sink, decoded from its name.
#[derive(Debug, Eq, PartialEq, Clone)]
struct RolledFile {
  date: u32,
  time: u32,
  path: PathBuf,
}

impl RolledFile {
  fn started_at(&self) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(
      (self.date / 10_000) as i32,
      self.date / 100 % 100,
      self.date % 100,
    )?;
    date.and_hms_opt(self.time / 10_000, self.time / 100 % 100, self.time % 100)
  }
}

impl Ord for RolledFile {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    // Oldest first: by date, then by time of day.
    self
      .date
      .cmp(&other.date)
      .then_with(|| self.time.cmp(&other.time))
      .then_with(|| self.path.cmp(&other.path))
  }
}

impl PartialOrd for RolledFile {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

fn local_at(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
  Local
    .from_local_datetime(&date.and_hms_opt(hour, minute, 0)?)
    .earliest()
}

/// Next occurrence of `hour:minute:00` strictly after `now`.
pub(crate) fn next_rotation_after(now: DateTime<Local>, hour: u32, minute: u32) -> DateTime<Local> {
  let today = now.date_naive();
  if let Some(at) = local_at(today, hour, minute).filter(|at| *at > now) {
    return at;
  }
  today
    .succ_opt()
    .and_then(|tomorrow| local_at(tomorrow, hour, minute))
    .unwrap_or_else(|| now + Duration::days(1))
}

/// Immutable placement and limits of one sink.
#[derive(Debug, Clone)]
struct RotationPolicy {
  directory: PathBuf,
  file_name: String,
  rotation_hour: u32,
  rotation_minute: u32,
  max_size: u64,
  max_files: usize,
}

impl RotationPolicy {
  fn calc_filename(&self, started: DateTime<Local>) -> PathBuf {
    self
      .directory
      .join(format!("{}-{}", started.format(STAMP_FORMAT), self.file_name))
  }
}

struct RotateState {
  writer: Option<BufWriter<File>>,
  current_path: Option<PathBuf>,
  current_size: u64,
  next_rotation: DateTime<Local>,
  /// Live files, oldest first. The back entry is the file being written,
  /// or the one to open on the first write.
  files: VecDeque<PathBuf>,
}

/// Rotates at a fixed time of day and whenever the current file grows past
/// `max_size`, keeping at most `max_files` files on disk.
///
/// `max_files == 0` disables both startup discovery and retention.
/// `max_size == 0` disables size rotation.
pub struct RotateDailyFileSink {
  name: String,
  policy: RotationPolicy,
  level: SinkLevel,
  state: Mutex<RotateState>,
}

impl RotateDailyFileSink {
  pub fn new(
    name: &str,
    base_path: &Path,
    rotation_hour: u32,
    rotation_minute: u32,
    max_size: u64,
    max_files: usize,
  ) -> Result<Self> {
    Self::new_at(
      name,
      base_path,
      rotation_hour,
      rotation_minute,
      max_size,
      max_files,
      Local::now(),
    )
  }

  /// Testable constructor that allows injecting the current time.
  pub(crate) fn new_at(
    name: &str,
    base_path: &Path,
    rotation_hour: u32,
    rotation_minute: u32,
    max_size: u64,
    max_files: usize,
    now: DateTime<Local>,
  ) -> Result<Self> {
    if rotation_hour > 23 {
      return Err(Error::InvalidParameter {
        field: "rotation_hour".to_string(),
        message: format!("sink '{}': {} is outside 0..=23", name, rotation_hour),
      });
    }
    if rotation_minute > 59 {
      return Err(Error::InvalidParameter {
        field: "rotation_minute".to_string(),
        message: format!("sink '{}': {} is outside 0..=59", name, rotation_minute),
      });
    }
    let file_name = base_path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .filter(|n| !n.is_empty())
      .ok_or_else(|| Error::SinkSetup {
        sink_name: name.to_string(),
        reason: format!("{:?} does not name a file", base_path),
      })?;
    ensure_parent_dir(name, base_path)?;
    let directory = match base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
      Some(parent) => parent.to_path_buf(),
      None => PathBuf::from("."),
    };

    let policy = RotationPolicy {
      directory,
      file_name,
      rotation_hour,
      rotation_minute,
      max_size,
      max_files,
    };
    let next_rotation = next_rotation_after(now, rotation_hour, rotation_minute);
    let files = if max_files > 0 {
      Self::discover(name, &policy, now, next_rotation)?
    } else {
      VecDeque::from([policy.calc_filename(now)])
    };

    Ok(Self {
      name: name.to_string(),
      policy,
      level: SinkLevel::new(LogLevel::Trace),
      state: Mutex::new(RotateState {
        writer: None,
        current_path: None,
        current_size: 0,
        next_rotation,
        files,
      }),
    })
  }

  /// Re-adopts files from earlier runs: keeps the newest `max_files`, deletes
  /// the rest, and reuses the newest one if it was started after the most
  /// recent rotation instant.
  fn discover(
    name: &str,
    policy: &RotationPolicy,
    now: DateTime<Local>,
    next_rotation: DateTime<Local>,
  ) -> Result<VecDeque<PathBuf>> {
    let mut found = Self::find_rolled_files(policy)?;
    found.sort();

    let excess = found.len().saturating_sub(policy.max_files);
    for old_file in found.drain(..excess) {
      if let Err(e) = fs::remove_file(&old_file.path) {
        eprintln!(
          "[unilog:WARN] Failed to delete old log file {:?}: {}",
          old_file.path, e
        );
      }
    }

    let last_rotation = (next_rotation - Duration::days(1)).naive_local();
    let reuse_newest = found
      .last()
      .and_then(RolledFile::started_at)
      .is_some_and(|started| started >= last_rotation);

    let mut files: VecDeque<PathBuf> = found.into_iter().map(|f| f.path).collect();
    if reuse_newest {
      println!(
        "[unilog] Sink '{}' re-adopted {} existing file(s).",
        name,
        files.len()
      );
    } else {
      let fresh = policy.calc_filename(now);
      if !files.contains(&fresh) {
        files.push_back(fresh);
      }
      Self::evict_excess(policy, &mut files)?;
    }
    Ok(files)
  }

  /// Finds every file in the sink directory named `YYYYMMDD-HHMMSS-<file name>`.
  fn find_rolled_files(policy: &RotationPolicy) -> Result<Vec<RolledFile>> {
    let mut files = Vec::new();
    if !policy.directory.exists() {
      return Ok(files);
    }
    let pattern = Regex::new(&format!(
      r"^(\d{{8}})-(\d{{6}})-{}$",
      regex::escape(&policy.file_name)
    ))
    .map_err(|e| Error::InvalidParameter {
      field: "base_file_name".to_string(),
      message: e.to_string(),
    })?;

    for entry in fs::read_dir(&policy.directory)? {
      let path = entry?.path();
      if !path.is_file() {
        continue;
      }
      let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        continue;
      };
      if let Some(caps) = pattern.captures(file_name) {
        if let (Ok(date), Ok(time)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
          files.push(RolledFile { date, time, path });
        }
      }
    }
    Ok(files)
  }

  /// Drops the oldest entries beyond `max_files`, deleting them from disk.
  /// A file that is already gone is fine; any other failure is returned.
  fn evict_excess(policy: &RotationPolicy, files: &mut VecDeque<PathBuf>) -> Result<()> {
    if policy.max_files == 0 {
      return Ok(());
    }
    while files.len() > policy.max_files {
      let Some(old) = files.pop_front() else { break };
      match fs::remove_file(&old) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => return Err(Error::RetentionIo { path: old, source }),
      }
    }
    Ok(())
  }

  /// A name for a file started at `now` that no live or queued file uses yet.
  ///
  /// On a collision the stamp moves forward one second at a time, so several
  /// size rolls within one second yield stamps ahead of the clock. The stamp
  /// stays unique and ordered, which is what discovery and retention sort by.
  fn unique_filename(&self, state: &RotateState, now: DateTime<Local>) -> PathBuf {
    let mut started = now;
    loop {
      let candidate = self.policy.calc_filename(started);
      let taken = state.current_path.as_ref() == Some(&candidate)
        || state.files.contains(&candidate)
        || candidate.exists();
      if !taken {
        return candidate;
      }
      started += Duration::seconds(1);
    }
  }

  /// Closes the current file, starts a new one and applies retention.
  fn rotate(&self, state: &mut RotateState, now: DateTime<Local>) -> Result<()> {
    if let Some(mut writer) = state.writer.take() {
      writer.flush()?;
    }
    // A queued name that never got written to does not count as a live file.
    if state.current_path.is_none() {
      if let Some(back) = state.files.back() {
        if !back.exists() {
          state.files.pop_back();
        }
      }
    }

    let path = self.unique_filename(state, now);
    let (writer, current_size) = open_append(&self.name, &path)?;
    state.writer = Some(writer);
    state.current_size = current_size;
    state.current_path = Some(path.clone());
    if self.policy.max_files == 0 {
      state.files.clear();
    }
    state.files.push_back(path);
    Self::evict_excess(&self.policy, &mut state.files)
  }

  /// Opens the newest live file for appending.
  fn open_current(&self, state: &mut RotateState, now: DateTime<Local>) -> Result<()> {
    let path = match state.files.back() {
      Some(path) => path.clone(),
      None => {
        let path = self.policy.calc_filename(now);
        state.files.push_back(path.clone());
        path
      }
    };
    let (writer, current_size) = open_append(&self.name, &path)?;
    state.writer = Some(writer);
    state.current_size = current_size;
    state.current_path = Some(path);
    Ok(())
  }

  pub(crate) fn write_at(&self, bytes: &[u8], now: DateTime<Local>) -> Result<()> {
    let mut state = self.state.lock();

    if now >= state.next_rotation {
      self.rotate(&mut state, now)?;
      state.next_rotation =
        next_rotation_after(now, self.policy.rotation_hour, self.policy.rotation_minute);
    } else if state.writer.is_none() {
      self.open_current(&mut state, now)?;
    }

    let Some(writer) = state.writer.as_mut() else {
      return Err(Error::SinkSetup {
        sink_name: self.name.clone(),
        reason: "no file open after rotation".to_string(),
      });
    };
    writer.write_all(bytes)?;
    state.current_size += bytes.len() as u64;

    if self.policy.max_size > 0 && state.current_size > self.policy.max_size {
      self.rotate(&mut state, now)?;
    }
    Ok(())
  }

  /// The file currently written to, if one has been opened.
  pub fn current_path(&self) -> Option<PathBuf> {
    self.state.lock().current_path.clone()
  }

  /// Live files, oldest first.
  pub fn live_files(&self) -> Vec<PathBuf> {
    self.state.lock().files.iter().cloned().collect()
  }
}

impl Sink for RotateDailyFileSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn log(&self, record: &LogRecord, formatted: &FormattedRecord) -> Result<()> {
    self.write_at(&formatted.bytes, record.timestamp)
  }

  fn flush(&self) -> Result<()> {
    if let Some(writer) = self.state.lock().writer.as_mut() {
      writer.flush()?;
    }
    Ok(())
  }

  fn level(&self) -> LogLevel {
    self.level.get()
  }

  fn set_level(&self, level: LogLevel) {
    self.level.set(level)
  }
}
