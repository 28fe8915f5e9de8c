// Adapters feeding records from the `log` and `tracing` facades into a Registry.

mod layer;
mod log_handler;
mod visitor;

pub use layer::RegistryLayer;
pub use log_handler::{install_log_bridge, LogBridge};

use crate::config::entity::MAIN_LOGGER;
use crate::error_handling::{send_error_report, InternalErrorSource};
use crate::logger::Logger;
use crate::model::LogRecord;
use crate::registry::Registry;
use std::sync::Arc;

/// The logger named like the target if there is one, else `MAIN`.
fn route(registry: &Registry, target: &str) -> Option<Arc<Logger>> {
  registry
    .find_logger(target)
    .or_else(|| registry.find_logger(MAIN_LOGGER))
}

/// Re-stamps the record with the routed logger's name and delivers it.
fn deliver(registry: &Registry, target: &str, mut record: LogRecord) {
  let Some(logger) = route(registry, target) else {
    return;
  };
  if !logger.should_log(record.level) {
    return;
  }
  record.logger_name = logger.name().to_string();
  if let Err(e) = logger.log_record(record) {
    send_error_report(
      None,
      InternalErrorSource::SinkWrite {
        logger_name: logger.name().to_string(),
      },
      e,
      Some(format!("target {}", target)),
    );
  }
}
