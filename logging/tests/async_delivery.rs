use pretty_assertions::assert_eq;
use std::sync::{mpsc, Arc, Condvar, Mutex};
use std::thread;
use std::time::Duration;
use unilog::encoders::FormattedRecord;
use unilog::logger::{Delivery, Logger};
use unilog::sink::Sink;
use unilog::thread_pool::{OverflowPolicy, ThreadPool};
use unilog::{Error, InternalErrorSource, LogLevel, LogRecord, Result};

/// Records messages; the message "hold" parks the writing worker until `open`.
struct GateSink {
  lines: Mutex<Vec<String>>,
  state: Mutex<(bool, bool)>,
  changed: Condvar,
}

impl GateSink {
  fn new() -> Arc<Self> {
    Arc::new(Self {
      lines: Mutex::new(Vec::new()),
      state: Mutex::new((false, false)),
      changed: Condvar::new(),
    })
  }

  fn wait_until_held(&self) {
    let mut state = self.state.lock().unwrap();
    while !state.0 {
      state = self.changed.wait(state).unwrap();
    }
  }

  fn open(&self) {
    self.state.lock().unwrap().1 = true;
    self.changed.notify_all();
  }

  fn lines(&self) -> Vec<String> {
    self.lines.lock().unwrap().clone()
  }
}

impl Sink for GateSink {
  fn name(&self) -> &str {
    "gate"
  }

  fn log(&self, record: &LogRecord, _formatted: &FormattedRecord) -> Result<()> {
    if record.message == "hold" {
      let mut state = self.state.lock().unwrap();
      state.0 = true;
      self.changed.notify_all();
      while !state.1 {
        state = self.changed.wait(state).unwrap();
      }
    }
    self.lines.lock().unwrap().push(record.message.clone());
    Ok(())
  }

  fn flush(&self) -> Result<()> {
    Ok(())
  }

  fn level(&self) -> LogLevel {
    LogLevel::Trace
  }

  fn set_level(&self, _level: LogLevel) {}
}

struct FailingSink;

impl Sink for FailingSink {
  fn name(&self) -> &str {
    "broken"
  }

  fn log(&self, _record: &LogRecord, _formatted: &FormattedRecord) -> Result<()> {
    Err(Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone")))
  }

  fn flush(&self) -> Result<()> {
    Ok(())
  }

  fn level(&self) -> LogLevel {
    LogLevel::Trace
  }

  fn set_level(&self, _level: LogLevel) {}
}

fn gated_logger(policy: OverflowPolicy) -> (Arc<ThreadPool>, Arc<GateSink>, Arc<Logger>) {
  let pool = Arc::new(ThreadPool::new(1, 2, None).unwrap());
  let sink = GateSink::new();
  let logger = Logger::new(
    "gated",
    vec![sink.clone() as Arc<dyn Sink>],
    "%v",
    Delivery::Async {
      pool: Arc::clone(&pool),
      policy,
    },
  );
  (pool, sink, Arc::new(logger))
}

#[test]
fn overrun_oldest_drops_queued_records_without_blocking() {
  let (pool, sink, logger) = gated_logger(OverflowPolicy::OverrunOldest);
  logger.info("hold").unwrap();
  sink.wait_until_held();

  let (done_tx, done_rx) = mpsc::channel();
  let producer = Arc::clone(&logger);
  thread::spawn(move || {
    for msg in ["2", "3", "4", "5"] {
      producer.info(msg).unwrap();
    }
    done_tx.send(()).unwrap();
  });
  done_rx
    .recv_timeout(Duration::from_secs(5))
    .expect("posting must not wait for the worker");
  assert_eq!(pool.overrun_count(), 2);
  assert_eq!(pool.queue_len(), 2);

  sink.open();
  logger.flush().unwrap();
  assert_eq!(sink.lines(), vec!["hold", "4", "5"]);
}

#[test]
fn overrun_oldest_never_drops_a_pending_flush() {
  let (pool, sink, logger) = gated_logger(OverflowPolicy::OverrunOldest);
  logger.info("hold").unwrap();
  sink.wait_until_held();

  let (flushed_tx, flushed_rx) = mpsc::channel();
  let flusher = Arc::clone(&logger);
  thread::spawn(move || {
    flusher.flush().unwrap();
    flushed_tx.send(()).unwrap();
  });
  for _ in 0..500 {
    if pool.queue_len() == 1 {
      break;
    }
    thread::sleep(Duration::from_millis(10));
  }
  assert_eq!(pool.queue_len(), 1);

  // The queue is full after "2"; "3" must displace "2", not the flush.
  logger.info("2").unwrap();
  logger.info("3").unwrap();
  assert_eq!(pool.overrun_count(), 1);
  assert!(flushed_rx.recv_timeout(Duration::from_millis(200)).is_err());

  sink.open();
  flushed_rx.recv_timeout(Duration::from_secs(5)).unwrap();
  logger.flush().unwrap();
  assert_eq!(sink.lines(), vec!["hold", "3"]);
}

#[test]
fn overrun_oldest_waits_when_only_flushes_are_queued() {
  let (pool, sink, logger) = gated_logger(OverflowPolicy::OverrunOldest);
  logger.info("hold").unwrap();
  sink.wait_until_held();

  for _ in 0..2 {
    let flusher = Arc::clone(&logger);
    thread::spawn(move || flusher.flush().unwrap());
  }
  for _ in 0..500 {
    if pool.queue_len() == 2 {
      break;
    }
    thread::sleep(Duration::from_millis(10));
  }
  assert_eq!(pool.queue_len(), 2);

  let (done_tx, done_rx) = mpsc::channel();
  let producer = Arc::clone(&logger);
  thread::spawn(move || {
    producer.info("late").unwrap();
    done_tx.send(()).unwrap();
  });
  assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());

  sink.open();
  done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
  logger.flush().unwrap();
  assert_eq!(sink.lines(), vec!["hold", "late"]);
  assert_eq!(pool.overrun_count(), 0);
}

#[test]
fn block_waits_for_queue_space() {
  let (pool, sink, logger) = gated_logger(OverflowPolicy::Block);
  logger.info("hold").unwrap();
  sink.wait_until_held();
  logger.info("2").unwrap();
  logger.info("3").unwrap();
  assert_eq!(pool.queue_len(), pool.capacity());

  let (done_tx, done_rx) = mpsc::channel();
  let producer = Arc::clone(&logger);
  thread::spawn(move || {
    producer.info("4").unwrap();
    done_tx.send(()).unwrap();
  });
  assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());

  sink.open();
  done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
  logger.flush().unwrap();
  assert_eq!(sink.lines(), vec!["hold", "2", "3", "4"]);
  assert_eq!(pool.overrun_count(), 0);
}

#[test]
fn worker_failures_reach_the_error_channel() {
  let (tx, rx) = fibre::mpsc::bounded(8);
  let pool = Arc::new(ThreadPool::new(1, 8, Some(tx)).unwrap());
  let good = GateSink::new();
  let logger = Logger::new(
    "fragile",
    vec![Arc::new(FailingSink) as Arc<dyn Sink>, good.clone() as Arc<dyn Sink>],
    "%v",
    Delivery::Async {
      pool: Arc::clone(&pool),
      policy: OverflowPolicy::Block,
    },
  );
  logger.warn("still delivered").unwrap();
  logger.flush().unwrap();

  assert_eq!(good.lines(), vec!["still delivered"]);
  let report = rx.try_recv().unwrap();
  assert!(matches!(
    report.source,
    InternalErrorSource::SinkWrite { ref logger_name } if logger_name == "fragile"
  ));
  assert!(report.error_message.contains("disk gone"));
}

#[test]
fn sync_logger_returns_sink_errors() {
  let logger = Logger::new(
    "direct",
    vec![Arc::new(FailingSink) as Arc<dyn Sink>],
    "%v",
    Delivery::Sync,
  );
  assert!(matches!(logger.error("nope"), Err(Error::Io(_))));
  assert!(logger.debug("filtered").is_ok());
}
