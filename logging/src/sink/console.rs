use super::{Sink, SinkLevel};
use crate::config::entity::ConsoleStream;
use crate::encoders::FormattedRecord;
use crate::error::Result;
use crate::model::{LogLevel, LogRecord};
use parking_lot::Mutex;
use std::io::{self, IsTerminal, Write};

const RESET: &str = "\x1b[m";

fn level_color(level: LogLevel) -> &'static str {
  match level {
    LogLevel::Trace => "\x1b[37m",
    LogLevel::Debug => "\x1b[36m",
    LogLevel::Info => "\x1b[32m",
    LogLevel::Warn => "\x1b[33m\x1b[1m",
    LogLevel::Error => "\x1b[31m\x1b[1m",
    LogLevel::Critical => "\x1b[1m\x1b[41m",
    LogLevel::Off => "",
  }
}

/// Writes a record, wrapping its color range in ANSI codes when `colored`.
pub(crate) fn write_record<W: Write>(
  out: &mut W,
  formatted: &FormattedRecord,
  level: LogLevel,
  colored: bool,
) -> io::Result<()> {
  match formatted.color_range.as_ref().filter(|_| colored) {
    Some(range) if range.start < range.end && range.end <= formatted.len() => {
      out.write_all(&formatted.bytes[..range.start])?;
      out.write_all(level_color(level).as_bytes())?;
      out.write_all(&formatted.bytes[range.clone()])?;
      out.write_all(RESET.as_bytes())?;
      out.write_all(&formatted.bytes[range.end..])
    }
    _ => out.write_all(&formatted.bytes),
  }
}

/// Standard output or standard error, optionally colored.
pub struct ConsoleSink {
  name: String,
  level: SinkLevel,
  stream: ConsoleStream,
  colored: bool,
  lock: Mutex<()>,
}

impl ConsoleSink {
  /// Color is only emitted when the stream is a terminal.
  pub fn new(name: &str, stream: ConsoleStream, color: bool) -> Self {
    let is_terminal = match stream {
      ConsoleStream::Stdout => io::stdout().is_terminal(),
      ConsoleStream::Stderr => io::stderr().is_terminal(),
    };
    Self {
      name: name.to_string(),
      level: SinkLevel::new(LogLevel::Trace),
      stream,
      colored: color && is_terminal,
      lock: Mutex::new(()),
    }
  }
}

impl Sink for ConsoleSink {
  fn name(&self) -> &str {
    &self.name
  }

  fn log(&self, record: &LogRecord, formatted: &FormattedRecord) -> Result<()> {
    let _guard = self.lock.lock();
    match self.stream {
      ConsoleStream::Stdout => {
        write_record(&mut io::stdout().lock(), formatted, record.level, self.colored)?
      }
      ConsoleStream::Stderr => {
        write_record(&mut io::stderr().lock(), formatted, record.level, self.colored)?
      }
    }
    Ok(())
  }

  fn flush(&self) -> Result<()> {
    let _guard = self.lock.lock();
    match self.stream {
      ConsoleStream::Stdout => io::stdout().flush()?,
      ConsoleStream::Stderr => io::stderr().flush()?,
    }
    Ok(())
  }

  fn level(&self) -> LogLevel {
    self.level.get()
  }

  fn set_level(&self, level: LogLevel) {
    self.level.set(level)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn formatted(text: &str, color_range: Option<std::ops::Range<usize>>) -> FormattedRecord {
    FormattedRecord {
      bytes: text.as_bytes().to_vec(),
      color_range,
    }
  }

  #[test]
  fn colors_only_the_marked_range() {
    let mut out = Vec::new();
    write_record(&mut out, &formatted("[warn] disk\n", Some(1..5)), LogLevel::Warn, true).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "[\x1b[33m\x1b[1mwarn\x1b[m] disk\n"
    );
  }

  #[test]
  fn plain_output_ignores_range() {
    let mut out = Vec::new();
    write_record(&mut out, &formatted("[warn] disk\n", Some(1..5)), LogLevel::Warn, false).unwrap();
    assert_eq!(out, b"[warn] disk\n");
  }

  #[test]
  fn out_of_bounds_range_is_ignored() {
    let mut out = Vec::new();
    write_record(&mut out, &formatted("hi\n", Some(1..40)), LogLevel::Info, true).unwrap();
    assert_eq!(out, b"hi\n");
  }
}
