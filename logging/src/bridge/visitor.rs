use std::fmt::Write;
use tracing::field::{Field, Visit};

/// Collects an event's `message` field and renders the rest as `key=value`.
#[derive(Default)]
pub(crate) struct MessageVisitor {
  message: Option<String>,
  fields: String,
}

impl MessageVisitor {
  fn record_field(&mut self, field_name: &str, value: String) {
    if field_name == "message" && self.message.is_none() {
      self.message = Some(value);
      return;
    }
    if !self.fields.is_empty() {
      self.fields.push(' ');
    }
    let _ = write!(self.fields, "{}={}", field_name, value);
  }

  /// The message followed by the other fields.
  pub(crate) fn finish(self) -> String {
    match (self.message, self.fields.is_empty()) {
      (Some(message), true) => message,
      (Some(message), false) => format!("{} {}", message, self.fields),
      (None, _) => self.fields,
    }
  }
}

impl Visit for MessageVisitor {
  fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
    self.record_field(field.name(), format!("{:?}", value));
  }

  fn record_str(&mut self, field: &Field, value: &str) {
    if field.name() == "message" {
      self.record_field(field.name(), value.to_string());
    } else {
      self.record_field(field.name(), format!("{:?}", value));
    }
  }

  fn record_i64(&mut self, field: &Field, value: i64) {
    self.record_field(field.name(), value.to_string());
  }

  fn record_u64(&mut self, field: &Field, value: u64) {
    self.record_field(field.name(), value.to_string());
  }

  fn record_f64(&mut self, field: &Field, value: f64) {
    self.record_field(field.name(), value.to_string());
  }

  fn record_bool(&mut self, field: &Field, value: bool) {
    self.record_field(field.name(), value.to_string());
  }
}
