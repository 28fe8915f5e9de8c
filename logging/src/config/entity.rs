// Validated configuration entities built from (and written back to) the raw document.

use crate::config::raw::{LoggerConfigRaw, SinkConfigRaw, ThreadPoolRaw};
use crate::error::{Error, Result};
use crate::model::LogLevel;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PATTERN_NAME: &str = "general_pattern";
pub const DEFAULT_PATTERN: &str = "%Y-%m-%d %H:%M:%S,%e %L [thread-%t] %n : %v";

pub const DEFAULT_SINK_NAME: &str = "color_stdout_sink";
pub const DEFAULT_SINK_FILE: &str = "./default.log";
pub const DEFAULT_MAX_SIZE: u64 = 25 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: u64 = 30;

pub const DEFAULT_LOGGER_NAME: &str = "console_logger";

pub const MAIN_LOGGER: &str = "MAIN";
pub const MAIN_FULL_SINK: &str = "Full";
pub const MAIN_ERROR_SINK: &str = "Error";
const MAIN_MAX_FILES: u64 = 365;

pub const DEFAULT_THREAD_COUNT: usize = 5;
pub const DEFAULT_QUEUE_SIZE: usize = 4096;
const MAX_THREAD_COUNT: i64 = 100_000;
const MAX_QUEUE_SIZE: i64 = 1_000_000;

/// The destination families a sink can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFamily {
  Console,
  ConsoleColor,
  FileBasic,
  FileDaily,
  FileRotatingBySize,
  FileRotatingDaily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
  Stdout,
  Stderr,
}

/// Every sink type string accepted in `SINKS.<name>.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkType {
  StdoutSt,
  StdoutMt,
  StderrSt,
  StderrMt,
  StdoutColorSt,
  StdoutColorMt,
  StderrColorSt,
  StderrColorMt,
  BasicFileSt,
  BasicFileMt,
  DailyFileSt,
  DailyFileMt,
  RotatingFileSt,
  RotatingFileMt,
  RotateDailyFileSt,
  RotateDailyFileMt,
}

impl SinkType {
  pub const ALL: [SinkType; 16] = [
    SinkType::StdoutSt,
    SinkType::StdoutMt,
    SinkType::StderrSt,
    SinkType::StderrMt,
    SinkType::StdoutColorSt,
    SinkType::StdoutColorMt,
    SinkType::StderrColorSt,
    SinkType::StderrColorMt,
    SinkType::BasicFileSt,
    SinkType::BasicFileMt,
    SinkType::DailyFileSt,
    SinkType::DailyFileMt,
    SinkType::RotatingFileSt,
    SinkType::RotatingFileMt,
    SinkType::RotateDailyFileSt,
    SinkType::RotateDailyFileMt,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      SinkType::StdoutSt => "stdout_sink_st",
      SinkType::StdoutMt => "stdout_sink_mt",
      SinkType::StderrSt => "stderr_sink_st",
      SinkType::StderrMt => "stderr_sink_mt",
      SinkType::StdoutColorSt => "stdout_color_sink_st",
      SinkType::StdoutColorMt => "stdout_color_sink_mt",
      SinkType::StderrColorSt => "stderr_color_sink_st",
      SinkType::StderrColorMt => "stderr_color_sink_mt",
      SinkType::BasicFileSt => "basic_file_sink_st",
      SinkType::BasicFileMt => "basic_file_sink_mt",
      SinkType::DailyFileSt => "daily_file_sink_st",
      SinkType::DailyFileMt => "daily_file_sink_mt",
      SinkType::RotatingFileSt => "rotating_file_sink_st",
      SinkType::RotatingFileMt => "rotating_file_sink_mt",
      SinkType::RotateDailyFileSt => "rotate_daily_file_sink_st",
      SinkType::RotateDailyFileMt => "rotate_daily_file_sink_mt",
    }
  }

  /// Looks up a type string, `None` if it names no known sink.
  pub fn from_type_name(name: &str) -> Option<SinkType> {
    SinkType::ALL.into_iter().find(|t| t.as_str() == name)
  }

  pub fn family(self) -> SinkFamily {
    match self {
      SinkType::StdoutSt | SinkType::StdoutMt | SinkType::StderrSt | SinkType::StderrMt => {
        SinkFamily::Console
      }
      SinkType::StdoutColorSt
      | SinkType::StdoutColorMt
      | SinkType::StderrColorSt
      | SinkType::StderrColorMt => SinkFamily::ConsoleColor,
      SinkType::BasicFileSt | SinkType::BasicFileMt => SinkFamily::FileBasic,
      SinkType::DailyFileSt | SinkType::DailyFileMt => SinkFamily::FileDaily,
      SinkType::RotatingFileSt | SinkType::RotatingFileMt => SinkFamily::FileRotatingBySize,
      SinkType::RotateDailyFileSt | SinkType::RotateDailyFileMt => SinkFamily::FileRotatingDaily,
    }
  }

  /// Which standard stream a console sink writes to.
  pub fn console_stream(self) -> Option<ConsoleStream> {
    match self {
      SinkType::StdoutSt | SinkType::StdoutMt | SinkType::StdoutColorSt | SinkType::StdoutColorMt => {
        Some(ConsoleStream::Stdout)
      }
      SinkType::StderrSt | SinkType::StderrMt | SinkType::StderrColorSt | SinkType::StderrColorMt => {
        Some(ConsoleStream::Stderr)
      }
      _ => None,
    }
  }

  pub fn is_multi_threaded(self) -> bool {
    self.as_str().ends_with("_mt")
  }

  pub fn is_file(self) -> bool {
    matches!(
      self.family(),
      SinkFamily::FileBasic
        | SinkFamily::FileDaily
        | SinkFamily::FileRotatingBySize
        | SinkFamily::FileRotatingDaily
    )
  }

  pub fn has_rotation_time(self) -> bool {
    matches!(
      self.family(),
      SinkFamily::FileDaily | SinkFamily::FileRotatingDaily
    )
  }

  pub fn has_max_size(self) -> bool {
    matches!(
      self.family(),
      SinkFamily::FileRotatingBySize | SinkFamily::FileRotatingDaily
    )
  }

  pub fn has_max_files(self) -> bool {
    matches!(
      self.family(),
      SinkFamily::FileDaily | SinkFamily::FileRotatingBySize | SinkFamily::FileRotatingDaily
    )
  }
}

impl fmt::Display for SinkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn reject(entity: &str, name: &str, field: &str, value: impl fmt::Display, reason: &str) -> bool {
  eprintln!(
    "[unilog:WARN] Ignoring {} = {} for {} '{}': {}",
    field, value, entity, name, reason
  );
  false
}

// ===================================================================================
//                                   SINK
// ===================================================================================

/// One output destination. Fields outside the sink's family are kept but ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkSpec {
  name: String,
  sink_type: SinkType,
  base_file_name: String,
  rotation_hour: u32,
  rotation_minute: u32,
  max_size: u64,
  max_files: u64,
  level: LogLevel,
}

impl Default for SinkSpec {
  fn default() -> Self {
    Self {
      name: DEFAULT_SINK_NAME.to_string(),
      sink_type: SinkType::StdoutColorMt,
      base_file_name: DEFAULT_SINK_FILE.to_string(),
      rotation_hour: 0,
      rotation_minute: 0,
      max_size: DEFAULT_MAX_SIZE,
      max_files: DEFAULT_MAX_FILES,
      level: LogLevel::Info,
    }
  }
}

impl SinkSpec {
  pub fn new(name: &str, sink_type: SinkType) -> Self {
    let mut spec = SinkSpec {
      sink_type,
      ..Default::default()
    };
    spec.set_name(name);
    spec
  }

  /// A rotating-daily file sink with default rotation, size and retention.
  pub fn rotate_daily(name: &str) -> Self {
    Self::new(name, SinkType::RotateDailyFileMt)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn sink_type(&self) -> SinkType {
    self.sink_type
  }

  pub fn level(&self) -> LogLevel {
    self.level
  }

  pub fn base_file_name(&self) -> Option<&str> {
    self.sink_type.is_file().then_some(self.base_file_name.as_str())
  }

  pub fn file_path(&self) -> Option<PathBuf> {
    self.base_file_name().map(PathBuf::from)
  }

  pub fn rotation_hour(&self) -> Option<u32> {
    self.sink_type.has_rotation_time().then_some(self.rotation_hour)
  }

  pub fn rotation_minute(&self) -> Option<u32> {
    self.sink_type.has_rotation_time().then_some(self.rotation_minute)
  }

  pub fn max_size(&self) -> Option<u64> {
    self.sink_type.has_max_size().then_some(self.max_size)
  }

  pub fn max_files(&self) -> Option<u64> {
    self.sink_type.has_max_files().then_some(self.max_files)
  }

  /// Empty names fall back to the default sink name.
  pub fn set_name(&mut self, name: &str) {
    self.name = if name.is_empty() {
      DEFAULT_SINK_NAME.to_string()
    } else {
      name.to_string()
    };
  }

  pub fn set_sink_type(&mut self, sink_type: SinkType) {
    self.sink_type = sink_type;
  }

  pub fn set_level(&mut self, level: LogLevel) {
    self.level = level;
  }

  /// Parses and applies a level name, keeping the prior level on failure.
  pub fn set_level_str(&mut self, level: &str) -> bool {
    match level.parse() {
      Ok(level) => {
        self.level = level;
        true
      }
      Err(_) => reject("sink", &self.name, "level", level, "unknown level"),
    }
  }

  /// Empty paths fall back to the default file name.
  pub fn set_base_file_name(&mut self, path: &str) -> bool {
    if !self.sink_type.is_file() {
      return reject("sink", &self.name, "base_file_name", path, "not a file sink");
    }
    self.base_file_name = if path.is_empty() {
      DEFAULT_SINK_FILE.to_string()
    } else {
      path.to_string()
    };
    true
  }

  pub fn set_rotation_hour(&mut self, hour: i64) -> bool {
    if !self.sink_type.has_rotation_time() {
      return reject("sink", &self.name, "rotation_hour", hour, "no daily rotation");
    }
    if !(0..=23).contains(&hour) {
      return reject("sink", &self.name, "rotation_hour", hour, "must be within 0..=23");
    }
    self.rotation_hour = hour as u32;
    true
  }

  pub fn set_rotation_minute(&mut self, minute: i64) -> bool {
    if !self.sink_type.has_rotation_time() {
      return reject("sink", &self.name, "rotation_minute", minute, "no daily rotation");
    }
    if !(0..=59).contains(&minute) {
      return reject("sink", &self.name, "rotation_minute", minute, "must be within 0..=59");
    }
    self.rotation_minute = minute as u32;
    true
  }

  pub fn set_max_size(&mut self, max_size: i64) -> bool {
    if !self.sink_type.has_max_size() {
      return reject("sink", &self.name, "max_size", max_size, "no size limit");
    }
    if max_size < 0 {
      return reject("sink", &self.name, "max_size", max_size, "must not be negative");
    }
    self.max_size = max_size as u64;
    true
  }

  pub fn set_max_files(&mut self, max_files: i64) -> bool {
    if !self.sink_type.has_max_files() {
      return reject("sink", &self.name, "max_files", max_files, "no retention");
    }
    if max_files < 0 {
      return reject("sink", &self.name, "max_files", max_files, "must not be negative");
    }
    self.max_files = max_files as u64;
    true
  }

  /// True for file sinks whose path was never configured.
  pub fn has_default_path(&self) -> bool {
    self.sink_type.is_file()
      && (self.base_file_name.is_empty() || self.base_file_name == DEFAULT_SINK_FILE)
  }

  /// Points a file sink left at the default path to `log_dir/<name>.log`.
  pub fn assign_default_path(&mut self, log_dir: &Path) {
    if self.has_default_path() {
      self.base_file_name = log_dir
        .join(format!("{}.log", self.name))
        .to_string_lossy()
        .into_owned();
    }
  }

  pub fn from_raw(name: &str, raw: &SinkConfigRaw) -> Result<Self> {
    let sink_type =
      SinkType::from_type_name(&raw.sink_type).ok_or_else(|| Error::UnknownSinkType {
        sink_name: name.to_string(),
        type_name: raw.sink_type.clone(),
      })?;
    let mut spec = SinkSpec::new(name, sink_type);
    if let Some(path) = &raw.base_file_name {
      spec.set_base_file_name(path);
    }
    if let Some(hour) = raw.rotation_hour {
      spec.set_rotation_hour(hour);
    }
    if let Some(minute) = raw.rotation_minute {
      spec.set_rotation_minute(minute);
    }
    if let Some(max_size) = raw.max_size {
      spec.set_max_size(max_size);
    }
    if let Some(max_files) = raw.max_files {
      spec.set_max_files(max_files);
    }
    if let Some(level) = &raw.level {
      spec.set_level_str(level);
    }
    Ok(spec)
  }

  /// Serializes only the fields applicable to this sink's type.
  pub fn to_raw(&self) -> SinkConfigRaw {
    SinkConfigRaw {
      sink_type: self.sink_type.as_str().to_string(),
      base_file_name: self.base_file_name().map(str::to_string),
      rotation_hour: self.rotation_hour().map(i64::from),
      rotation_minute: self.rotation_minute().map(i64::from),
      max_size: self.max_size().map(|v| v as i64),
      max_files: self.max_files().map(|v| v as i64),
      level: Some(self.level.as_str().to_string()),
    }
  }
}

// ===================================================================================
//                                   LOGGER
// ===================================================================================

/// How a logger hands records to its sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
  /// The caller writes to the sinks itself.
  Sync,
  /// Queued on the shared pool; the caller blocks while the queue is full.
  #[default]
  Async,
  /// Queued on the shared pool; a full queue discards its oldest message.
  AsyncNb,
}

impl DeliveryMode {
  pub fn as_str(self) -> &'static str {
    match self {
      DeliveryMode::Sync => "sync",
      DeliveryMode::Async => "async",
      DeliveryMode::AsyncNb => "async_nb",
    }
  }

  pub fn from_name(name: &str) -> Option<DeliveryMode> {
    match name {
      "sync" => Some(DeliveryMode::Sync),
      "async" => Some(DeliveryMode::Async),
      "async_nb" => Some(DeliveryMode::AsyncNb),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggerSpec {
  name: String,
  sinks: Vec<SinkSpec>,
  pattern_name: String,
  level: LogLevel,
  mode: DeliveryMode,
}

impl Default for LoggerSpec {
  fn default() -> Self {
    Self {
      name: DEFAULT_LOGGER_NAME.to_string(),
      sinks: vec![SinkSpec::default()],
      pattern_name: DEFAULT_PATTERN_NAME.to_string(),
      level: LogLevel::Info,
      mode: DeliveryMode::Async,
    }
  }
}

impl LoggerSpec {
  pub fn new(name: &str) -> Self {
    let mut spec = LoggerSpec::default();
    spec.set_name(name);
    spec
  }

  /// The spec synthesized for a name nobody configured: its own rotating-daily
  /// file sink plus the shared console sink.
  pub fn provisioned(name: &str) -> Self {
    let mut spec = LoggerSpec::new(name);
    spec.sinks = vec![SinkSpec::rotate_daily(name), SinkSpec::default()];
    spec
  }

  /// The `MAIN` logger written on first run.
  pub fn bootstrap_main() -> Self {
    let mut full = SinkSpec::rotate_daily(MAIN_FULL_SINK);
    full.set_level(LogLevel::Trace);
    full.set_max_files(MAIN_MAX_FILES as i64);
    let mut error = SinkSpec::rotate_daily(MAIN_ERROR_SINK);
    error.set_level(LogLevel::Error);
    error.set_max_files(MAIN_MAX_FILES as i64);

    let mut spec = LoggerSpec::new(MAIN_LOGGER);
    spec.level = LogLevel::Trace;
    spec.sinks = vec![full, error, SinkSpec::default()];
    spec
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn sinks(&self) -> &[SinkSpec] {
    &self.sinks
  }

  pub fn sinks_mut(&mut self) -> &mut [SinkSpec] {
    &mut self.sinks
  }

  pub fn sink_names(&self) -> Vec<String> {
    self.sinks.iter().map(|s| s.name().to_string()).collect()
  }

  pub fn pattern_name(&self) -> &str {
    &self.pattern_name
  }

  pub fn level(&self) -> LogLevel {
    self.level
  }

  pub fn mode(&self) -> DeliveryMode {
    self.mode
  }

  pub fn set_name(&mut self, name: &str) {
    self.name = if name.is_empty() {
      DEFAULT_LOGGER_NAME.to_string()
    } else {
      name.to_string()
    };
  }

  /// A logger needs at least one sink; an empty list is refused.
  pub fn set_sinks(&mut self, sinks: Vec<SinkSpec>) -> bool {
    if sinks.is_empty() {
      return reject("logger", &self.name, "sinks", "[]", "at least one sink is required");
    }
    self.sinks = sinks;
    true
  }

  pub fn set_pattern_name(&mut self, pattern_name: &str) {
    self.pattern_name = if pattern_name.is_empty() {
      DEFAULT_PATTERN_NAME.to_string()
    } else {
      pattern_name.to_string()
    };
  }

  pub fn set_level(&mut self, level: LogLevel) {
    self.level = level;
  }

  pub fn set_level_str(&mut self, level: &str) -> bool {
    match level.parse() {
      Ok(level) => {
        self.level = level;
        true
      }
      Err(_) => reject("logger", &self.name, "level", level, "unknown level"),
    }
  }

  pub fn set_mode(&mut self, mode: DeliveryMode) {
    self.mode = mode;
  }

  pub fn set_mode_str(&mut self, mode: &str) -> bool {
    match DeliveryMode::from_name(mode) {
      Some(mode) => {
        self.mode = mode;
        true
      }
      None => reject("logger", &self.name, "sync_type", mode, "expected sync, async or async_nb"),
    }
  }

  /// Builds a logger from its raw section and the already-resolved sinks it names.
  pub fn from_raw(name: &str, raw: &LoggerConfigRaw, sinks: Vec<SinkSpec>) -> Result<Self> {
    let mut spec = LoggerSpec::new(name);
    if !spec.set_sinks(sinks) {
      return Err(Error::ConfigParse(format!(
        "logger '{}' does not reference any sink",
        name
      )));
    }
    if let Some(pattern) = &raw.pattern {
      spec.set_pattern_name(pattern);
    }
    if let Some(level) = &raw.level {
      spec.set_level_str(level);
    }
    if let Some(mode) = &raw.sync_type {
      spec.set_mode_str(mode);
    }
    Ok(spec)
  }

  pub fn to_raw(&self) -> LoggerConfigRaw {
    LoggerConfigRaw {
      sinks: self.sink_names(),
      pattern: Some(self.pattern_name.clone()),
      level: Some(self.level.as_str().to_string()),
      sync_type: Some(self.mode.as_str().to_string()),
    }
  }
}

// ===================================================================================
//                                 THREAD POOL
// ===================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadPoolSpec {
  thread_count: usize,
  queue_size: usize,
}

impl Default for ThreadPoolSpec {
  fn default() -> Self {
    Self {
      thread_count: DEFAULT_THREAD_COUNT,
      queue_size: DEFAULT_QUEUE_SIZE,
    }
  }
}

impl ThreadPoolSpec {
  pub fn thread_count(&self) -> usize {
    self.thread_count
  }

  pub fn queue_size(&self) -> usize {
    self.queue_size
  }

  pub fn set_thread_count(&mut self, thread_count: i64) -> bool {
    if !(1..=MAX_THREAD_COUNT).contains(&thread_count) {
      return reject("thread pool", "THREAD_POOL", "thread_count", thread_count, "out of range");
    }
    self.thread_count = thread_count as usize;
    true
  }

  pub fn set_queue_size(&mut self, queue_size: i64) -> bool {
    if !(1..=MAX_QUEUE_SIZE).contains(&queue_size) {
      return reject("thread pool", "THREAD_POOL", "queue_size", queue_size, "out of range");
    }
    self.queue_size = queue_size as usize;
    true
  }

  pub fn from_raw(raw: &ThreadPoolRaw) -> Self {
    let mut spec = ThreadPoolSpec::default();
    if let Some(thread_count) = raw.thread_count {
      spec.set_thread_count(thread_count);
    }
    if let Some(queue_size) = raw.queue_size {
      spec.set_queue_size(queue_size);
    }
    spec
  }

  pub fn to_raw(&self) -> ThreadPoolRaw {
    ThreadPoolRaw {
      thread_count: Some(self.thread_count as i64),
      queue_size: Some(self.queue_size as i64),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn every_type_name_maps_back() {
    for sink_type in SinkType::ALL {
      assert_eq!(SinkType::from_type_name(sink_type.as_str()), Some(sink_type));
    }
    assert_eq!(SinkType::from_type_name("syslog_sink_mt"), None);
  }

  #[test]
  fn accessors_report_not_applicable_outside_family() {
    let console = SinkSpec::default();
    assert_eq!(console.base_file_name(), None);
    assert_eq!(console.rotation_hour(), None);
    assert_eq!(console.max_size(), None);
    assert_eq!(console.max_files(), None);

    let basic = SinkSpec::new("plain", SinkType::BasicFileMt);
    assert_eq!(basic.base_file_name(), Some(DEFAULT_SINK_FILE));
    assert_eq!(basic.rotation_hour(), None);
    assert_eq!(basic.max_files(), None);

    let daily = SinkSpec::new("daily", SinkType::DailyFileSt);
    assert_eq!(daily.rotation_minute(), Some(0));
    assert_eq!(daily.max_size(), None);
    assert_eq!(daily.max_files(), Some(DEFAULT_MAX_FILES));

    let sized = SinkSpec::new("sized", SinkType::RotatingFileMt);
    assert_eq!(sized.rotation_hour(), None);
    assert_eq!(sized.max_size(), Some(DEFAULT_MAX_SIZE));
  }

  #[test]
  fn out_of_range_setters_keep_prior_value() {
    let mut sink = SinkSpec::rotate_daily("app");
    assert!(sink.set_rotation_hour(6));
    assert!(!sink.set_rotation_hour(24));
    assert!(!sink.set_rotation_minute(-1));
    assert!(!sink.set_max_files(-3));
    assert_eq!(sink.rotation_hour(), Some(6));
    assert_eq!(sink.rotation_minute(), Some(0));
    assert_eq!(sink.max_files(), Some(DEFAULT_MAX_FILES));

    let mut pool = ThreadPoolSpec::default();
    assert!(!pool.set_thread_count(0));
    assert!(!pool.set_queue_size(1_000_001));
    assert!(pool.set_queue_size(2));
    assert_eq!(pool.thread_count(), DEFAULT_THREAD_COUNT);
    assert_eq!(pool.queue_size(), 2);
  }

  #[test]
  fn setters_ignore_fields_outside_family() {
    let mut console = SinkSpec::default();
    assert!(!console.set_base_file_name("/tmp/x.log"));
    assert!(!console.set_max_size(10));
    assert!(!console.has_default_path());
  }

  #[test]
  fn sink_round_trips_only_applicable_fields() {
    let mut sink = SinkSpec::new("sized", SinkType::RotatingFileMt);
    sink.set_base_file_name("/var/log/sized.log");
    sink.set_max_size(1024);
    sink.set_max_files(3);
    let raw = sink.to_raw();
    assert_eq!(raw.rotation_hour, None);
    assert_eq!(raw.max_size, Some(1024));
    assert_eq!(SinkSpec::from_raw("sized", &raw).unwrap(), sink);
  }

  #[test]
  fn unknown_sink_type_is_an_error() {
    let raw = SinkConfigRaw {
      sink_type: "carrier_pigeon".to_string(),
      base_file_name: None,
      rotation_hour: None,
      rotation_minute: None,
      max_size: None,
      max_files: None,
      level: None,
    };
    let err = SinkSpec::from_raw("bird", &raw).unwrap_err();
    assert!(matches!(err, Error::UnknownSinkType { ref type_name, .. } if type_name == "carrier_pigeon"));
  }

  #[test]
  fn default_path_is_assigned_under_log_dir() {
    let mut sink = SinkSpec::rotate_daily("audit");
    assert!(sink.has_default_path());
    sink.assign_default_path(Path::new("/var/log/app"));
    assert_eq!(
      sink.file_path(),
      Some(Path::new("/var/log/app").join("audit.log"))
    );
    assert!(!sink.has_default_path());
  }

  #[test]
  fn logger_refuses_empty_sink_list() {
    let mut logger = LoggerSpec::new("app");
    assert!(!logger.set_sinks(Vec::new()));
    assert_eq!(logger.sinks().len(), 1);
    assert!(!logger.set_mode_str("eventually"));
    assert_eq!(logger.mode(), DeliveryMode::Async);
  }

  #[test]
  fn bootstrap_main_logger_layout() {
    let main = LoggerSpec::bootstrap_main();
    assert_eq!(main.name(), MAIN_LOGGER);
    assert_eq!(main.level(), LogLevel::Trace);
    assert_eq!(
      main.sink_names(),
      vec![MAIN_FULL_SINK, MAIN_ERROR_SINK, DEFAULT_SINK_NAME]
    );
    assert_eq!(main.sinks()[1].level(), LogLevel::Error);
    assert_eq!(main.sinks()[0].max_files(), Some(365));
  }
}
