// The process-wide lifecycle: init, on-demand logger creation, lookup and shutdown.

use crate::config::entity::{
  LoggerSpec, ThreadPoolSpec, DEFAULT_PATTERN, DEFAULT_PATTERN_NAME,
};
use crate::config::store::ConfigStore;
use crate::error::{Error, Result};
use crate::error_handling::{send_error_report, InternalErrorReport, InternalErrorSource};
use crate::logger::Logger;
use crate::sink::{build_sink, Sink};
use crate::thread_pool::ThreadPool;
use fibre::mpsc::{self, BoundedReceiver, BoundedSender};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const ERROR_CHANNEL_CAPACITY: usize = 256;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Everything built during `init` that later auto-provisioning needs.
struct Runtime {
  store: ConfigStore,
  log_dir: PathBuf,
  pool: Arc<ThreadPool>,
  patterns: BTreeMap<String, String>,
  sinks: HashMap<String, Arc<dyn Sink>>,
  error_tx: BoundedSender<InternalErrorReport>,
}

impl Runtime {
  /// `base` if no sink of that name exists yet, else `base_file`, `base_file_2`, ...
  fn free_sink_name(&self, base: &str) -> Result<String> {
    let mut candidate = base.to_string();
    let mut attempt = 1;
    while self.sinks.contains_key(&candidate) || self.store.is_defined_sink(&candidate)? {
      candidate = if attempt == 1 {
        format!("{}_file", base)
      } else {
        format!("{}_file_{}", base, attempt)
      };
      attempt += 1;
    }
    Ok(candidate)
  }

  /// Materializes a logger, reusing sinks already built under the same name.
  fn build_logger(&mut self, spec: &LoggerSpec) -> Result<Logger> {
    let pattern = self
      .patterns
      .get(spec.pattern_name())
      .ok_or_else(|| Error::PatternNotFound(spec.pattern_name().to_string()))?;

    let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(spec.sinks().len());
    for sink_spec in spec.sinks() {
      if sinks.iter().any(|s| s.name() == sink_spec.name()) {
        continue;
      }
      let sink = match self.sinks.get(sink_spec.name()) {
        Some(existing) => Arc::clone(existing),
        None => {
          let mut sink_spec = sink_spec.clone();
          sink_spec.assign_default_path(&self.log_dir);
          let built = build_sink(&sink_spec)?;
          self
            .sinks
            .insert(sink_spec.name().to_string(), Arc::clone(&built));
          built
        }
      };
      sinks.push(sink);
    }

    let logger = Logger::new(
      spec.name(),
      sinks,
      pattern,
      Logger::delivery_for(spec.mode(), &self.pool),
    );
    logger.set_level(spec.level());
    logger.flush_on(spec.level());
    Ok(logger)
  }
}

/// A registry of named loggers built from one configuration document.
///
/// Most programs use the process-wide instance through [`Registry::global`] or
/// the crate-level `init`/`get_logger`/`shutdown` functions; separate instances
/// are useful for tests and embedding.
pub struct Registry {
  runtime: Mutex<Option<Runtime>>,
  loggers: RwLock<HashMap<String, Arc<Logger>>>,
  initialized: AtomicBool,
  error_rx: Mutex<Option<BoundedReceiver<InternalErrorReport>>>,
}

impl Default for Registry {
  fn default() -> Self {
    Self::new()
  }
}

impl Registry {
  pub fn new() -> Self {
    Self {
      runtime: Mutex::new(None),
      loggers: RwLock::new(HashMap::new()),
      initialized: AtomicBool::new(false),
      error_rx: Mutex::new(None),
    }
  }

  pub fn global() -> &'static Registry {
    &GLOBAL_REGISTRY
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized.load(Ordering::Acquire)
  }

  /// Like [`Registry::try_init`], reporting failures on stderr instead.
  pub fn init(&self, config_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> bool {
    match self.try_init(config_path, log_dir) {
      Ok(()) => true,
      Err(e) => {
        eprintln!("[unilog:ERROR] Logging initialization failed: {}", e);
        false
      }
    }
  }

  /// Builds every configured logger. A second call after success does nothing.
  ///
  /// A missing or empty document is first bootstrapped with the default
  /// pattern, the default thread pool and the `MAIN` logger.
  pub fn try_init(&self, config_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> Result<()> {
    if self.is_initialized() {
      return Ok(());
    }
    let mut runtime_slot = self.runtime.lock();
    if self.is_initialized() {
      return Ok(());
    }

    let log_dir = log_dir.as_ref().to_path_buf();
    fs::create_dir_all(&log_dir)?;

    let store = ConfigStore::new(config_path.as_ref());
    if store.is_missing_or_empty()? {
      bootstrap_document(&store)?;
      store.clear_registries();
    }

    let patterns = store.read_patterns()?;
    let pool_spec = store.read_thread_pool()?;
    let specs = store.read_loggers()?;

    let (error_tx, error_rx) = mpsc::bounded::<InternalErrorReport>(ERROR_CHANNEL_CAPACITY);
    let pool = Arc::new(ThreadPool::new(
      pool_spec.thread_count(),
      pool_spec.queue_size(),
      Some(error_tx.clone()),
    )?);

    let mut runtime = Runtime {
      store,
      log_dir,
      pool,
      patterns,
      sinks: HashMap::new(),
      error_tx,
    };

    // Nothing is published until every logger has been built.
    let mut built = HashMap::with_capacity(specs.len());
    for spec in &specs {
      match runtime.build_logger(spec) {
        Ok(logger) => {
          built.insert(spec.name().to_string(), Arc::new(logger));
        }
        Err(e) => {
          drop(built);
          runtime.pool.shutdown();
          return Err(e);
        }
      }
    }

    println!(
      "[unilog] Initialized {} logger(s) from {:?}.",
      built.len(),
      runtime.store.path()
    );
    *self.loggers.write() = built;
    *self.error_rx.lock() = Some(error_rx);
    *runtime_slot = Some(runtime);
    self.initialized.store(true, Ordering::Release);
    Ok(())
  }

  /// Returns the named logger, creating and persisting a default one if the
  /// name is not configured.
  ///
  /// The created logger writes to its own rotating-daily file sink, named after
  /// the logger unless that sink name is already taken, plus the console sink.
  pub fn get_logger(&self, name: &str) -> Result<Arc<Logger>> {
    if let Some(logger) = self.find_logger(name) {
      return Ok(logger);
    }
    if name.is_empty() {
      return Err(Error::InvalidParameter {
        field: "logger name".to_string(),
        message: "a logger name must not be empty".to_string(),
      });
    }

    let mut runtime_slot = self.runtime.lock();
    let runtime = runtime_slot.as_mut().ok_or(Error::NotInitialized)?;
    if let Some(logger) = self.find_logger(name) {
      return Ok(logger);
    }

    let mut spec = LoggerSpec::provisioned(name);
    let file_sink = runtime.free_sink_name(name)?;
    if let Some(sink) = spec.sinks_mut().first_mut() {
      sink.set_name(&file_sink);
    }
    let logger = Arc::new(runtime.build_logger(&spec)?);
    self
      .loggers
      .write()
      .insert(spec.name().to_string(), Arc::clone(&logger));

    if let Err(e) = runtime.store.write_logger(&spec) {
      send_error_report(
        Some(&runtime.error_tx),
        InternalErrorSource::ConfigPersist {
          logger_name: name.to_string(),
        },
        e,
        Some(format!("{:?}", runtime.store.path())),
      );
    }
    Ok(logger)
  }

  /// Creates a logger from an explicit spec and persists it.
  ///
  /// Fails with `DuplicateName` if the name is already configured.
  pub fn create_logger(&self, spec: &LoggerSpec) -> Result<Arc<Logger>> {
    let mut runtime_slot = self.runtime.lock();
    let runtime = runtime_slot.as_mut().ok_or(Error::NotInitialized)?;
    if self.loggers.read().contains_key(spec.name()) {
      return Err(Error::DuplicateName {
        kind: "logger",
        name: spec.name().to_string(),
      });
    }
    let logger = Arc::new(runtime.build_logger(spec)?);
    runtime.store.write_logger(spec)?;
    self
      .loggers
      .write()
      .insert(spec.name().to_string(), Arc::clone(&logger));
    Ok(logger)
  }

  /// Adds a named pattern to the table and the document.
  pub fn add_pattern(&self, name: &str, pattern: &str) -> Result<()> {
    let mut runtime_slot = self.runtime.lock();
    let runtime = runtime_slot.as_mut().ok_or(Error::NotInitialized)?;
    runtime.store.write_pattern(name, pattern)?;
    runtime
      .patterns
      .insert(name.to_string(), pattern.to_string());
    Ok(())
  }

  /// Looks a logger up without creating it.
  pub fn find_logger(&self, name: &str) -> Option<Arc<Logger>> {
    self.loggers.read().get(name).cloned()
  }

  pub fn logger_names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.loggers.read().keys().cloned().collect();
    names.sort();
    names
  }

  pub fn config_path(&self) -> Option<PathBuf> {
    self
      .runtime
      .lock()
      .as_ref()
      .map(|r| r.store.path().to_path_buf())
  }

  /// The receiving end for failures on worker threads. Can be taken once per `init`.
  pub fn take_error_receiver(&self) -> Option<BoundedReceiver<InternalErrorReport>> {
    self.error_rx.lock().take()
  }

  /// Flushes every logger, waiting for queued records of async loggers.
  pub fn flush_all(&self) -> Result<()> {
    let loggers: Vec<Arc<Logger>> = self.loggers.read().values().cloned().collect();
    let mut first_error = None;
    for logger in loggers {
      if let Err(e) = logger.flush() {
        first_error.get_or_insert(e);
      }
    }
    match first_error {
      Some(e) => Err(e),
      None => Ok(()),
    }
  }

  /// Drains the worker pool, flushes every sink and forgets all loggers.
  /// A later `init` starts from the configuration document again.
  pub fn shutdown(&self) {
    let mut runtime_slot = self.runtime.lock();
    let Some(runtime) = runtime_slot.take() else {
      return;
    };
    self.initialized.store(false, Ordering::Release);

    let loggers: Vec<Arc<Logger>> = self.loggers.write().drain().map(|(_, l)| l).collect();
    runtime.pool.shutdown();
    for logger in &loggers {
      if let Err(e) = logger.flush_sinks_now() {
        eprintln!(
          "[unilog:ERROR] Failed to flush logger '{}' during shutdown: {}",
          logger.name(),
          e
        );
      }
    }
    *self.error_rx.lock() = None;
  }
}

impl Drop for Registry {
  fn drop(&mut self) {
    self.shutdown();
  }
}

/// Writes the first-run document: sections, default pattern, pool and `MAIN`.
fn bootstrap_document(store: &ConfigStore) -> Result<()> {
  store.bootstrap()?;
  store.write_pattern(DEFAULT_PATTERN_NAME, DEFAULT_PATTERN)?;
  store.write_thread_pool(&ThreadPoolSpec::default())?;
  store.write_logger(&LoggerSpec::bootstrap_main())?;
  Ok(())
}
