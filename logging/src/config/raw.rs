// Structs directly mapping to the JSON document on disk.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SINKS_KEY: &str = "SINKS";
pub const LOGGERS_KEY: &str = "LOGGERS";
pub const PATTERNS_KEY: &str = "PATTERNS";
pub const THREAD_POOL_KEY: &str = "THREAD_POOL";

/// The four top-level sections, in document order.
pub const SECTION_KEYS: [&str; 4] = [SINKS_KEY, LOGGERS_KEY, PATTERNS_KEY, THREAD_POOL_KEY];

// --- Top Level Document ---
// A section is `null` until something is written into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigDocument {
  #[serde(rename = "SINKS")]
  pub sinks: Option<BTreeMap<String, SinkConfigRaw>>,
  #[serde(rename = "LOGGERS")]
  pub loggers: Option<BTreeMap<String, LoggerConfigRaw>>,
  #[serde(rename = "PATTERNS")]
  pub patterns: Option<BTreeMap<String, String>>,
  #[serde(rename = "THREAD_POOL")]
  pub thread_pool: Option<ThreadPoolRaw>,
}

// --- Sink ---
// Integers stay signed so out-of-range values reach validation instead of failing the parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SinkConfigRaw {
  #[serde(rename = "type")]
  pub sink_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub base_file_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rotation_hour: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rotation_minute: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_size: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_files: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
}

// --- Logger ---
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggerConfigRaw {
  pub sinks: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub pattern: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub level: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sync_type: Option<String>,
}

// --- Thread Pool ---
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreadPoolRaw {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub thread_count: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub queue_size: Option<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn empty_document_serializes_null_sections() {
    let json = serde_json::to_value(ConfigDocument::default()).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "SINKS": null, "LOGGERS": null, "PATTERNS": null, "THREAD_POOL": null })
    );
  }

  #[test]
  fn sink_omits_absent_fields() {
    let sink = SinkConfigRaw {
      sink_type: "stdout_color_sink_mt".to_string(),
      base_file_name: None,
      rotation_hour: None,
      rotation_minute: None,
      max_size: None,
      max_files: None,
      level: Some("info".to_string()),
    };
    let json = serde_json::to_value(&sink).unwrap();
    assert_eq!(
      json,
      serde_json::json!({ "type": "stdout_color_sink_mt", "level": "info" })
    );
  }

  #[test]
  fn logger_section_parses() {
    let json = r#"{
      "sinks": ["Full", "Error"],
      "pattern": "general_pattern",
      "level": "trace",
      "sync_type": "async"
    }"#;
    let logger: LoggerConfigRaw = serde_json::from_str(json).unwrap();
    assert_eq!(logger.sinks, vec!["Full".to_string(), "Error".to_string()]);
    assert_eq!(logger.sync_type.as_deref(), Some("async"));
  }

  #[test]
  fn unknown_top_level_section_is_rejected() {
    let json = r#"{ "SINKS": null, "LOGGERS": null, "PATTERNS": null, "THREAD_POOL": null, "EXTRA": 1 }"#;
    assert!(serde_json::from_str::<ConfigDocument>(json).is_err());
  }
}
