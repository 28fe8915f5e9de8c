use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the `unilog` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Failed to write configuration file {path:?}: {source}")]
  ConfigWrite {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("A {kind} named '{name}' is already defined")]
  DuplicateName { kind: &'static str, name: String },

  #[error("Sink '{sink_name}' has unknown type '{type_name}'")]
  UnknownSinkType { sink_name: String, type_name: String },

  #[error("Invalid value for '{field}': {message}")]
  InvalidParameter { field: String, message: String },

  #[error("Failed to delete evicted log file {path:?}: {source}")]
  RetentionIo {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Sink setup failed for '{sink_name}': {reason}")]
  SinkSetup { sink_name: String, reason: String },

  #[error("Pattern '{0}' is not defined")]
  PatternNotFound(String),

  #[error("The logging registry has not been initialized")]
  NotInitialized,

  #[error("Failed to install the log bridge: {0}")]
  LogBridgeInit(String),

  #[error("The async worker pool has been shut down")]
  PoolClosed,

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::ConfigParse(e.to_string())
  }
}

/// A specialized `Result` type for `unilog` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
