// Reads and writes the configuration document, one whole-document round trip per call.

use crate::config::entity::{LoggerSpec, SinkSpec, ThreadPoolSpec};
use crate::config::raw::{ConfigDocument, SECTION_KEYS};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Serializes every read and write of any configuration file in the process.
static CONFIG_FILE_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// Names already seen through this store, used for "already defined" checks.
#[derive(Debug, Default)]
struct NameRegistry {
  sinks: HashSet<String>,
  loggers: HashSet<String>,
  patterns: HashSet<String>,
}

pub struct ConfigStore {
  path: PathBuf,
  names: Mutex<NameRegistry>,
}

impl ConfigStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      names: Mutex::new(NameRegistry::default()),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// True when there is no document yet, or the file holds only whitespace.
  pub fn is_missing_or_empty(&self) -> Result<bool> {
    let _guard = CONFIG_FILE_LOCK.lock();
    match fs::read_to_string(&self.path) {
      Ok(content) => Ok(content.trim().is_empty()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
      Err(e) => Err(Error::Io(e)),
    }
  }

  pub fn read(&self) -> Result<ConfigDocument> {
    let _guard = CONFIG_FILE_LOCK.lock();
    self.read_locked()
  }

  pub fn write(&self, document: &ConfigDocument) -> Result<()> {
    let _guard = CONFIG_FILE_LOCK.lock();
    self.write_locked(document)
  }

  /// Writes the four top-level sections, all empty.
  pub fn bootstrap(&self) -> Result<()> {
    println!(
      "[unilog] Creating configuration document at {:?}.",
      self.path
    );
    self.write(&ConfigDocument::default())
  }

  /// Forgets every name seen so far.
  pub fn clear_registries(&self) {
    let mut names = self.names.lock();
    names.sinks.clear();
    names.loggers.clear();
    names.patterns.clear();
  }

  pub fn is_known_logger(&self, name: &str) -> bool {
    self.names.lock().loggers.contains(name)
  }

  pub fn is_known_sink(&self, name: &str) -> bool {
    self.names.lock().sinks.contains(name)
  }

  /// True if the sink was seen through this store or is defined in the document,
  /// even when no logger references it.
  pub fn is_defined_sink(&self, name: &str) -> Result<bool> {
    if self.is_known_sink(name) {
      return Ok(true);
    }
    let document = self.read()?;
    Ok(document.sinks.is_some_and(|sinks| sinks.contains_key(name)))
  }

  pub fn is_known_pattern(&self, name: &str) -> bool {
    self.names.lock().patterns.contains(name)
  }

  /// Reads every logger together with the sinks it references.
  pub fn read_loggers(&self) -> Result<Vec<LoggerSpec>> {
    let document = self.read()?;
    let empty_sinks = BTreeMap::new();
    let sinks = document.sinks.as_ref().unwrap_or(&empty_sinks);

    let mut specs = Vec::new();
    for (logger_name, raw) in document.loggers.iter().flatten() {
      let mut logger_sinks = Vec::with_capacity(raw.sinks.len());
      for sink_name in &raw.sinks {
        let sink_raw = sinks.get(sink_name).ok_or_else(|| {
          Error::ConfigParse(format!(
            "logger '{}' references undefined sink '{}'",
            logger_name, sink_name
          ))
        })?;
        logger_sinks.push(SinkSpec::from_raw(sink_name, sink_raw)?);
      }
      specs.push(LoggerSpec::from_raw(logger_name, raw, logger_sinks)?);
    }

    let mut names = self.names.lock();
    for spec in &specs {
      names.loggers.insert(spec.name().to_string());
      for sink in spec.sinks() {
        names.sinks.insert(sink.name().to_string());
      }
    }
    Ok(specs)
  }

  /// Persists a new logger and any of its sinks not yet in the document.
  pub fn write_logger(&self, spec: &LoggerSpec) -> Result<()> {
    let _guard = CONFIG_FILE_LOCK.lock();
    let mut document = self.read_locked()?;

    let loggers = document.loggers.get_or_insert_with(BTreeMap::new);
    if self.is_known_logger(spec.name()) || loggers.contains_key(spec.name()) {
      return Err(Error::DuplicateName {
        kind: "logger",
        name: spec.name().to_string(),
      });
    }
    loggers.insert(spec.name().to_string(), spec.to_raw());

    let sinks = document.sinks.get_or_insert_with(BTreeMap::new);
    for sink in spec.sinks() {
      sinks
        .entry(sink.name().to_string())
        .or_insert_with(|| sink.to_raw());
    }
    self.write_locked(&document)?;

    let mut names = self.names.lock();
    names.loggers.insert(spec.name().to_string());
    for sink in spec.sinks() {
      names.sinks.insert(sink.name().to_string());
    }
    Ok(())
  }

  /// Persists a sink. A sink that is already defined is left untouched.
  pub fn write_sink(&self, spec: &SinkSpec) -> Result<()> {
    let _guard = CONFIG_FILE_LOCK.lock();
    if self.is_known_sink(spec.name()) {
      return Ok(());
    }
    let mut document = self.read_locked()?;
    let sinks = document.sinks.get_or_insert_with(BTreeMap::new);
    if !sinks.contains_key(spec.name()) {
      sinks.insert(spec.name().to_string(), spec.to_raw());
      self.write_locked(&document)?;
    }
    self.names.lock().sinks.insert(spec.name().to_string());
    Ok(())
  }

  pub fn read_patterns(&self) -> Result<BTreeMap<String, String>> {
    let document = self.read()?;
    let patterns = document
      .patterns
      .ok_or_else(|| Error::ConfigParse("the PATTERNS section is empty".to_string()))?;
    self
      .names
      .lock()
      .patterns
      .extend(patterns.keys().cloned());
    Ok(patterns)
  }

  pub fn write_pattern(&self, name: &str, pattern: &str) -> Result<()> {
    let _guard = CONFIG_FILE_LOCK.lock();
    let mut document = self.read_locked()?;
    let patterns = document.patterns.get_or_insert_with(BTreeMap::new);
    if self.is_known_pattern(name) || patterns.contains_key(name) {
      return Err(Error::DuplicateName {
        kind: "pattern",
        name: name.to_string(),
      });
    }
    patterns.insert(name.to_string(), pattern.to_string());
    self.write_locked(&document)?;
    self.names.lock().patterns.insert(name.to_string());
    Ok(())
  }

  /// An empty THREAD_POOL section yields the default pool.
  pub fn read_thread_pool(&self) -> Result<ThreadPoolSpec> {
    let document = self.read()?;
    match document.thread_pool {
      Some(raw) => Ok(ThreadPoolSpec::from_raw(&raw)),
      None => {
        println!("[unilog] THREAD_POOL section is empty. Using the default pool.");
        Ok(ThreadPoolSpec::default())
      }
    }
  }

  pub fn write_thread_pool(&self, spec: &ThreadPoolSpec) -> Result<()> {
    let _guard = CONFIG_FILE_LOCK.lock();
    let mut document = self.read_locked()?;
    document.thread_pool = Some(spec.to_raw());
    self.write_locked(&document)
  }

  fn read_locked(&self) -> Result<ConfigDocument> {
    let content = fs::read_to_string(&self.path).map_err(|e| {
      Error::ConfigParse(format!("cannot read {:?}: {}", self.path, e))
    })?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    let object = value.as_object().ok_or_else(|| {
      Error::ConfigParse(format!("{:?} does not hold a JSON object", self.path))
    })?;
    if object.len() != SECTION_KEYS.len() || !SECTION_KEYS.iter().all(|k| object.contains_key(*k)) {
      return Err(Error::ConfigParse(format!(
        "{:?} must contain exactly the sections {:?}",
        self.path, SECTION_KEYS
      )));
    }
    Ok(serde_json::from_value(value)?)
  }

  /// Writes a sibling temp file, then renames it over the document.
  fn write_locked(&self, document: &ConfigDocument) -> Result<()> {
    let to_write_error = |source: std::io::Error| Error::ConfigWrite {
      path: self.path.clone(),
      source,
    };

    if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent).map_err(to_write_error)?;
    }
    let json = serde_json::to_string_pretty(document)?;

    let mut temp_name = self
      .path
      .file_name()
      .map(|n| n.to_os_string())
      .unwrap_or_else(|| "unilog.json".into());
    temp_name.push(".tmp");
    let temp_path = self.path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).map_err(to_write_error)?;
    file.write_all(json.as_bytes()).map_err(to_write_error)?;
    file.write_all(b"\n").map_err(to_write_error)?;
    file.sync_all().map_err(to_write_error)?;
    drop(file);
    fs::rename(&temp_path, &self.path).map_err(to_write_error)
  }
}
