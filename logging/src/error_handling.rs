use fibre::error::TrySendError;
use fibre::mpsc::BoundedSender;
use std::fmt;

/// Where a failure that could not be returned to a caller happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalErrorSource {
  SinkWrite { logger_name: String },
  SinkFlush { logger_name: String },
  ConfigPersist { logger_name: String },
  LogStream { logger_name: String },
}

impl fmt::Display for InternalErrorSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InternalErrorSource::SinkWrite { logger_name } => {
        write!(f, "SinkWrite {{ logger_name: \"{}\" }}", logger_name)
      }
      InternalErrorSource::SinkFlush { logger_name } => {
        write!(f, "SinkFlush {{ logger_name: \"{}\" }}", logger_name)
      }
      InternalErrorSource::ConfigPersist { logger_name } => {
        write!(f, "ConfigPersist {{ logger_name: \"{}\" }}", logger_name)
      }
      InternalErrorSource::LogStream { logger_name } => {
        write!(f, "LogStream {{ logger_name: \"{}\" }}", logger_name)
      }
    }
  }
}

#[derive(Debug)]
pub struct InternalErrorReport {
  pub source: InternalErrorSource,
  pub error_message: String,
  pub context: Option<String>,
  pub timestamp: chrono::DateTime<chrono::Local>,
}

impl InternalErrorReport {
  pub(crate) fn new<E: std::error::Error + 'static>(
    source: InternalErrorSource,
    error: E,
    context: Option<String>,
  ) -> Self {
    Self {
      source,
      error_message: error.to_string(),
      context,
      timestamp: chrono::Local::now(),
    }
  }
}

/// Prints the failure to stderr and forwards it on the report channel, if any.
pub(crate) fn send_error_report<E: std::error::Error + 'static>(
  tx: Option<&BoundedSender<InternalErrorReport>>,
  source: InternalErrorSource,
  error: E,
  context: Option<String>,
) {
  eprintln!("[unilog:ERROR] {}: {}", source, error);
  if let Some(tx) = tx {
    let report = InternalErrorReport::new(source, error, context);
    if let Err(TrySendError::Full(_report)) = tx.try_send(report) {
      eprintln!("[unilog:ERROR] Internal error channel full. Dropping error report.");
    }
  }
}
