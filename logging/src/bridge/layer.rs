use super::{deliver, visitor::MessageVisitor};
use crate::model::{LogLevel, LogRecord, SourceLocation};
use crate::registry::Registry;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// A `tracing` layer that hands every event to a Registry logger.
///
/// Events go to the logger named like their target, or to `MAIN`.
pub struct RegistryLayer {
  registry: &'static Registry,
}

impl RegistryLayer {
  pub fn new(registry: &'static Registry) -> Self {
    Self { registry }
  }

  fn build_record(event: &Event<'_>) -> LogRecord {
    let metadata = event.metadata();
    let mut visitor = MessageVisitor::default();
    event.record(&mut visitor);

    let location = metadata.file().map(|file| SourceLocation {
      file: file.to_string(),
      line: metadata.line().unwrap_or(0),
      function: metadata.module_path().map(str::to_string),
    });
    LogRecord::new(LogLevel::from(*metadata.level()), metadata.target(), visitor.finish())
      .with_location(location)
  }
}

impl<S> Layer<S> for RegistryLayer
where
  S: Subscriber,
{
  fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
    let record = Self::build_record(event);
    deliver(self.registry, event.metadata().target(), record);
  }
}
