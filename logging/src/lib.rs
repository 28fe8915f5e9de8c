//! `unilog` - a configuration-driven logging engine.
//!
//! Loggers and sinks are described in one JSON document with four sections
//! (`SINKS`, `LOGGERS`, `PATTERNS`, `THREAD_POOL`). [`init`] reads it, creating
//! a default document on first run, and builds every logger. Names nobody
//! configured are provisioned on first use by [`get_logger`] and written back
//! to the document. Asynchronous loggers share one bounded worker pool.
//!
//! ```no_run
//! unilog::init("config/log.json", "log");
//! let logger = unilog::get_logger("net").unwrap();
//! logger.info("listening").unwrap();
//! unilog::shutdown();
//! ```

pub mod bridge;
pub mod config;
pub mod encoders;
pub mod error;
pub mod error_handling;
pub mod log_stream;
pub mod logger;
pub mod model;
pub mod registry;
pub mod sink;
pub mod thread_pool;

// Re-export key public types for easier use by library consumers.
pub use config::entity::{
  DeliveryMode, LoggerSpec, SinkSpec, SinkType, ThreadPoolSpec, MAIN_LOGGER,
};
pub use config::{default_log_dir, find_config_file};
pub use error::{Error, Result};
pub use error_handling::{InternalErrorReport, InternalErrorSource};
pub use log_stream::LogStream;
pub use logger::Logger;
pub use model::{LogLevel, LogRecord, SourceLocation};
pub use registry::Registry;

use std::path::Path;
use std::sync::Arc;

/// Initializes the process-wide registry. Returns false, after reporting the
/// cause on stderr, if the configuration could not be read or built.
pub fn init(config_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> bool {
  Registry::global().init(config_path, log_dir)
}

/// Initializes from [`find_config_file`] and [`default_log_dir`].
pub fn init_default() -> bool {
  init(find_config_file(), default_log_dir())
}

/// Returns a logger from the process-wide registry, provisioning it if needed.
pub fn get_logger(name: &str) -> Result<Arc<Logger>> {
  Registry::global().get_logger(name)
}

/// Drains pending records and releases every logger of the process-wide registry.
pub fn shutdown() {
  Registry::global().shutdown()
}
