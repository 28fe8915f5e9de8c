// The shared worker pool draining every asynchronous logger.

use crate::error::{Error, Result};
use crate::error_handling::{send_error_report, InternalErrorReport, InternalErrorSource};
use crate::logger::LoggerCore;
use crate::model::LogRecord;
use fibre::mpsc::BoundedSender;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What `post` does when the queue is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
  /// The caller waits until a worker frees a slot.
  Block,
  /// The oldest queued record is discarded. Flush requests are never
  /// discarded, so the caller waits only when the queue holds nothing else.
  OverrunOldest,
}

/// Blocks a caller until a worker has processed its flush request.
#[derive(Default)]
pub(crate) struct FlushSignal {
  done: Mutex<bool>,
  cond: Condvar,
}

impl FlushSignal {
  pub(crate) fn complete(&self) {
    *self.done.lock() = true;
    self.cond.notify_all();
  }

  pub(crate) fn wait(&self) {
    let mut done = self.done.lock();
    while !*done {
      self.cond.wait(&mut done);
    }
  }
}

pub(crate) enum Job {
  Log(LogRecord),
  Flush(Option<Arc<FlushSignal>>),
}

impl Job {
  /// Releases anyone waiting on a job that will never run.
  fn abandon(self) {
    if let Job::Flush(Some(signal)) = self {
      signal.complete();
    }
  }
}

struct PoolMsg {
  core: Arc<LoggerCore>,
  job: Job,
}

/// Per-logger hand-off so that only one worker delivers for a logger at a time.
///
/// A worker that dequeues a job for a busy logger parks it here; the worker
/// already delivering for that logger runs it next, keeping submission order.
#[derive(Default)]
pub(crate) struct Inbox {
  busy: bool,
  pending: VecDeque<Job>,
}

impl Inbox {
  fn accept(&mut self, job: Job) -> Option<Job> {
    if self.busy {
      self.pending.push_back(job);
      None
    } else {
      self.busy = true;
      Some(job)
    }
  }

  fn next(&mut self) -> Option<Job> {
    let job = self.pending.pop_front();
    if job.is_none() {
      self.busy = false;
    }
    job
  }
}

struct PoolQueue {
  messages: VecDeque<PoolMsg>,
  closed: bool,
}

struct PoolShared {
  queue: Mutex<PoolQueue>,
  not_empty: Condvar,
  not_full: Condvar,
  capacity: usize,
  overruns: AtomicU64,
  error_tx: Option<BoundedSender<InternalErrorReport>>,
}

/// A fixed set of worker threads over one bounded queue.
pub struct ThreadPool {
  shared: Arc<PoolShared>,
  workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
  pub fn new(
    thread_count: usize,
    queue_size: usize,
    error_tx: Option<BoundedSender<InternalErrorReport>>,
  ) -> Result<Self> {
    if thread_count == 0 || queue_size == 0 {
      return Err(Error::InvalidParameter {
        field: "thread_pool".to_string(),
        message: format!(
          "thread_count ({}) and queue_size ({}) must both be at least 1",
          thread_count, queue_size
        ),
      });
    }
    let shared = Arc::new(PoolShared {
      queue: Mutex::new(PoolQueue {
        messages: VecDeque::with_capacity(queue_size.min(4096)),
        closed: false,
      }),
      not_empty: Condvar::new(),
      not_full: Condvar::new(),
      capacity: queue_size,
      overruns: AtomicU64::new(0),
      error_tx,
    });

    let pool = Self {
      shared,
      workers: Mutex::new(Vec::with_capacity(thread_count)),
    };
    for index in 0..thread_count {
      let worker_shared = Arc::clone(&pool.shared);
      // On failure `pool` is dropped, which stops the workers already started.
      let handle = thread::Builder::new()
        .name(format!("unilog-worker-{}", index))
        .spawn(move || worker_loop(worker_shared))?;
      pool.workers.lock().push(handle);
    }
    Ok(pool)
  }

  pub(crate) fn post(&self, core: Arc<LoggerCore>, job: Job, policy: OverflowPolicy) -> Result<()> {
    let shared = &self.shared;
    let mut queue = shared.queue.lock();
    if queue.closed {
      drop(queue);
      job.abandon();
      return Err(Error::PoolClosed);
    }
    // Flush jobs are never overrun; a queue holding only flushes makes even
    // `OverrunOldest` wait for space.
    while queue.messages.len() >= shared.capacity {
      let oldest_record = match policy {
        OverflowPolicy::Block => None,
        OverflowPolicy::OverrunOldest => queue
          .messages
          .iter()
          .position(|msg| matches!(msg.job, Job::Log(_))),
      };
      if let Some(index) = oldest_record {
        if let Some(dropped) = queue.messages.remove(index) {
          shared.overruns.fetch_add(1, Ordering::Relaxed);
          dropped.job.abandon();
        }
        continue;
      }
      shared.not_full.wait(&mut queue);
      if queue.closed {
        drop(queue);
        job.abandon();
        return Err(Error::PoolClosed);
      }
    }
    queue.messages.push_back(PoolMsg { core, job });
    drop(queue);
    shared.not_empty.notify_one();
    Ok(())
  }

  /// Messages discarded so far by `OverrunOldest` posts.
  pub fn overrun_count(&self) -> u64 {
    self.shared.overruns.load(Ordering::Relaxed)
  }

  pub fn queue_len(&self) -> usize {
    self.shared.queue.lock().messages.len()
  }

  pub fn capacity(&self) -> usize {
    self.shared.capacity
  }

  /// Stops accepting messages, lets the workers drain the queue, and joins them.
  pub fn shutdown(&self) {
    {
      let mut queue = self.shared.queue.lock();
      queue.closed = true;
    }
    self.shared.not_empty.notify_all();
    self.shared.not_full.notify_all();

    let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
    for handle in handles {
      if let Err(e) = handle.join() {
        eprintln!("[unilog:ERROR] Worker thread panicked during shutdown: {:?}", e);
      }
    }
  }
}

impl Drop for ThreadPool {
  fn drop(&mut self) {
    self.shutdown();
  }
}

fn worker_loop(shared: Arc<PoolShared>) {
  loop {
    let (core, job) = {
      let mut queue = shared.queue.lock();
      let msg = loop {
        match queue.messages.pop_front() {
          Some(msg) => break msg,
          None if queue.closed => return,
          None => shared.not_empty.wait(&mut queue),
        }
      };
      shared.not_full.notify_one();
      // Accepting while the queue is still locked keeps per-logger order.
      let accepted = msg.core.inbox.lock().accept(msg.job);
      match accepted {
        Some(job) => (msg.core, job),
        None => continue,
      }
    };

    let mut next = Some(job);
    while let Some(job) = next {
      run_job(&shared, &core, job);
      next = core.inbox.lock().next();
    }
  }
}

fn run_job(shared: &PoolShared, core: &LoggerCore, job: Job) {
  match job {
    Job::Log(record) => {
      if let Err(e) = core.sink_it(&record) {
        send_error_report(
          shared.error_tx.as_ref(),
          InternalErrorSource::SinkWrite {
            logger_name: core.name().to_string(),
          },
          e,
          Some(format!("level {}", record.level)),
        );
      }
    }
    Job::Flush(signal) => {
      if let Err(e) = core.flush_sinks() {
        send_error_report(
          shared.error_tx.as_ref(),
          InternalErrorSource::SinkFlush {
            logger_name: core.name().to_string(),
          },
          e,
          None,
        );
      }
      if let Some(signal) = signal {
        signal.complete();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inbox_hands_off_in_order() {
    let mut inbox = Inbox::default();
    assert!(inbox.accept(Job::Flush(None)).is_some());
    assert!(inbox.accept(Job::Flush(None)).is_none());
    assert!(inbox.accept(Job::Flush(None)).is_none());
    assert!(inbox.next().is_some());
    assert!(inbox.next().is_some());
    assert!(inbox.next().is_none());
    // No longer busy: the next job runs immediately.
    assert!(inbox.accept(Job::Flush(None)).is_some());
  }

  #[test]
  fn abandoned_flush_releases_waiter() {
    let signal = Arc::new(FlushSignal::default());
    Job::Flush(Some(Arc::clone(&signal))).abandon();
    signal.wait();
  }

  #[test]
  fn zero_sized_pool_is_rejected() {
    assert!(matches!(
      ThreadPool::new(0, 8, None),
      Err(Error::InvalidParameter { .. })
    ));
    assert!(ThreadPool::new(1, 0, None).is_err());
  }
}
