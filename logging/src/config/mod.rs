// src/config/mod.rs
// Configuration document, its validated entities, and the store persisting them.

pub mod entity;
pub mod raw;
pub mod store;

use std::env;
use std::path::PathBuf;

const CONFIG_PATH_ENV: &str = "UNILOG_CONFIG";
const LOG_DIR_ENV: &str = "UNILOG_LOG_DIR";
const DEFAULT_CONFIG_PATH: &str = "./config/log.json";
const DEFAULT_LOG_DIR: &str = "./log";

/// Path of the configuration document: `$UNILOG_CONFIG`, else `./config/log.json`.
///
/// The file does not need to exist; `init` bootstraps it on first run.
pub fn find_config_file() -> PathBuf {
  env::var(CONFIG_PATH_ENV)
    .ok()
    .filter(|s| !s.is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Directory for file sinks without an explicit path: `$UNILOG_LOG_DIR`, else `./log`.
pub fn default_log_dir() -> PathBuf {
  env::var(LOG_DIR_ENV)
    .ok()
    .filter(|s| !s.is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn config_path_honours_environment() {
    env::remove_var(CONFIG_PATH_ENV);
    assert_eq!(find_config_file(), PathBuf::from(DEFAULT_CONFIG_PATH));
    env::set_var(CONFIG_PATH_ENV, "/etc/app/log.json");
    assert_eq!(find_config_file(), PathBuf::from("/etc/app/log.json"));
    env::remove_var(CONFIG_PATH_ENV);
  }

  #[test]
  #[serial]
  fn log_dir_ignores_empty_variable() {
    env::set_var(LOG_DIR_ENV, "");
    assert_eq!(default_log_dir(), PathBuf::from(DEFAULT_LOG_DIR));
    env::remove_var(LOG_DIR_ENV);
  }
}
