// Turns LogRecords into the bytes sinks write.

use crate::model::LogRecord;
use std::ops::Range;
use std::sync::Arc;

pub mod pattern;
pub mod util;

pub use pattern::PatternFormatter;

/// A rendered record plus the byte range a color sink should highlight (`%^..%$`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormattedRecord {
  pub bytes: Vec<u8>,
  pub color_range: Option<Range<usize>>,
}

impl FormattedRecord {
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(&self.bytes)
  }
}

/// Trait for types that can render a `LogRecord` into a line of output.
pub trait RecordFormatter: Send + Sync + 'static {
  /// The output should include the trailing newline.
  fn format_record(&self, record: &LogRecord) -> FormattedRecord;
}

/// Creates the formatter for a pattern string from the pattern table.
pub(crate) fn new_record_formatter(pattern: &str) -> Arc<dyn RecordFormatter> {
  Arc::new(PatternFormatter::new(pattern))
}
