// examples/basic_usage.rs

use std::fmt::Write;
use std::path::Path;
use unilog::{LogLevel, MAIN_LOGGER};

fn main() -> unilog::Result<()> {
  // 1. Initialize from a JSON document. A missing document is created with
  //    the default pattern, thread pool and the MAIN logger.
  let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("target").join("unilog-demo");
  if !unilog::init(root.join("config").join("log.json"), root.join("log")) {
    return Err(unilog::Error::NotInitialized);
  }

  // 2. Failures on the worker threads are reported on this channel.
  let errors = unilog::Registry::global().take_error_receiver();

  // 3. MAIN writes to Full, Error and the colored console.
  let main = unilog::get_logger(MAIN_LOGGER)?;
  main.info("application started")?;
  main.warn("configuration is using defaults")?;

  // 4. Unknown names are provisioned and written back to the document.
  let db = unilog::get_logger("database")?;
  db.set_level(LogLevel::Debug);
  db.debug("connection pool ready")?;

  // 5. Streams submit when they go out of scope.
  {
    let mut line = unilog::log_stream::warn("database").with_prefix("[pool] ");
    write!(line, "{} of {} connections idle", 3, 8).ok();
  }

  // 6. The `log` facade can be routed into the registry too.
  unilog::bridge::install_log_bridge(unilog::Registry::global(), log::LevelFilter::Info)?;
  log::info!(target: "database", "routed through the log facade");

  unilog::Registry::global().flush_all()?;
  if let Some(rx) = errors {
    while let Ok(report) = rx.try_recv() {
      eprintln!("internal logging error: {}", report.error_message);
    }
  }

  println!("Loggers: {:?}", unilog::Registry::global().logger_names());
  unilog::shutdown();
  Ok(())
}
