// examples/rolling_usage.rs

use std::path::Path;
use std::sync::Arc;
use std::thread;
use unilog::sink::Sink;
use unilog::{DeliveryMode, LogLevel, LoggerSpec, SinkSpec};

fn main() -> unilog::Result<()> {
  let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("target").join("unilog-rolling");
  let registry = unilog::Registry::new();
  registry.try_init(root.join("log.json"), root.join("log"))?;

  // A rotating-daily sink with a tiny size limit so rolls happen quickly.
  let mut sink = SinkSpec::rotate_daily("high_volume");
  sink.set_max_size(4 * 1024);
  sink.set_max_files(5);
  sink.set_level(LogLevel::Trace);

  let mut spec = LoggerSpec::new("high_volume");
  spec.set_sinks(vec![sink]);
  spec.set_level(LogLevel::Trace);
  spec.set_mode(DeliveryMode::AsyncNb);

  let logger = match registry.find_logger("high_volume") {
    Some(logger) => logger,
    None => registry.create_logger(&spec)?,
  };

  let payload = "A".repeat(100);
  let handles: Vec<_> = (0..4)
    .map(|thread_id| {
      let logger = Arc::clone(&logger);
      let payload = payload.clone();
      thread::spawn(move || {
        for i in 1..=50 {
          let _ = logger.trace(format!("Thread {} | Message #{} | {}", thread_id, i, payload));
        }
      })
    })
    .collect();
  for handle in handles {
    let _ = handle.join();
  }

  logger.flush()?;
  println!("Files written for 'high_volume':");
  for sink in logger.sinks() {
    println!("  sink {}", sink.name());
  }
  for entry in std::fs::read_dir(root.join("log"))? {
    println!("  {}", entry?.path().display());
  }
  registry.shutdown();
  Ok(())
}
