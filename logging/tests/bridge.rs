use pretty_assertions::assert_eq;
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};
use tracing_subscriber::prelude::*;
use unilog::bridge::{install_log_bridge, RegistryLayer};
use unilog::Registry;

struct TestSetup {
  _temp_dir: TempDir,
  audit_log: PathBuf,
  main_log: PathBuf,
  registry: &'static Registry,
}

/// A registry with sync file loggers `audit` and `MAIN`.
fn setup() -> TestSetup {
  let temp_dir = tempdir().unwrap();
  let audit_log = temp_dir.path().join("audit.log");
  let main_log = temp_dir.path().join("main.log");
  let config_path = temp_dir.path().join("log.json");
  let document = serde_json::json!({
    "SINKS": {
      "audit_file": { "type": "basic_file_sink_mt", "base_file_name": audit_log.to_string_lossy(), "level": "trace" },
      "main_file": { "type": "basic_file_sink_mt", "base_file_name": main_log.to_string_lossy(), "level": "trace" }
    },
    "LOGGERS": {
      "audit": { "sinks": ["audit_file"], "pattern": "bridge", "level": "debug", "sync_type": "sync" },
      "MAIN": { "sinks": ["main_file"], "pattern": "bridge", "level": "trace", "sync_type": "sync" }
    },
    "PATTERNS": { "bridge": "%l|%n|%v" },
    "THREAD_POOL": { "thread_count": 1, "queue_size": 16 }
  });
  fs::write(&config_path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

  let registry: &'static Registry = Box::leak(Box::new(Registry::new()));
  registry.try_init(&config_path, temp_dir.path()).unwrap();
  TestSetup {
    _temp_dir: temp_dir,
    audit_log,
    main_log,
    registry,
  }
}

#[test]
fn tracing_events_route_by_target() {
  let setup = setup();
  let subscriber = tracing_subscriber::registry().with(RegistryLayer::new(setup.registry));
  tracing::subscriber::with_default(subscriber, || {
    tracing::info!(target: "audit", user = "bob", "login");
    tracing::trace!(target: "audit", "below the audit level");
    tracing::warn!(target: "other", "fallback");
  });
  setup.registry.flush_all().unwrap();

  assert_eq!(
    fs::read_to_string(&setup.audit_log).unwrap(),
    "info|audit|login user=\"bob\"\n"
  );
  assert_eq!(
    fs::read_to_string(&setup.main_log).unwrap(),
    "warning|MAIN|fallback\n"
  );
  setup.registry.shutdown();
}

#[test]
#[serial]
fn log_records_route_by_target() {
  let setup = setup();
  install_log_bridge(setup.registry, log::LevelFilter::Debug).unwrap();

  log::error!(target: "audit", "denied {}", 42);
  log::trace!(target: "audit", "filtered by max level");
  log::info!(target: "somewhere::else", "to main");
  log::logger().flush();

  assert_eq!(
    fs::read_to_string(&setup.audit_log).unwrap(),
    "error|audit|denied 42\n"
  );
  assert_eq!(
    fs::read_to_string(&setup.main_log).unwrap(),
    "info|MAIN|to main\n"
  );
  assert!(install_log_bridge(setup.registry, log::LevelFilter::Info).is_err());
  setup.registry.shutdown();
}
