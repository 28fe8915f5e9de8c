// src/encoders/pattern.rs
use super::{util, FormattedRecord, RecordFormatter};
use crate::model::LogRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

// A flag with optional alignment and width (`%-8l`, `%=6n`), or an escaped `%%`.
static PATTERN_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?P<specifier>%(?P<padding>[-=]?\d+)?(?P<flag>[a-zA-Z@!#^$]))|(?P<escaped>%%)")
    .expect("Pattern regex should be valid")
});

/// Represents a single piece of a parsed logging pattern.
#[derive(Debug)]
enum Segment {
  Literal(String),
  Specifier(PatternSpecifier),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
  Left,
  Right,
  Center,
}

/// The internal representation of a flag like `%-8l`.
#[derive(Debug)]
struct PatternSpecifier {
  flag: char,
  padding: Option<(Align, usize)>,
}

pub struct PatternFormatter {
  pattern: String,
  segments: Vec<Segment>,
}

impl PatternFormatter {
  pub fn new(pattern_string: &str) -> Self {
    Self {
      pattern: pattern_string.to_string(),
      segments: Self::parse(pattern_string),
    }
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  fn parse(pattern: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in PATTERN_REGEX.captures_iter(pattern) {
      let Some(mat) = caps.get(0) else { continue };

      if mat.start() > last_end {
        segments.push(Segment::Literal(pattern[last_end..mat.start()].to_string()));
      }

      if let Some(flag) = caps.name("flag").and_then(|m| m.as_str().chars().next()) {
        let padding = caps.name("padding").and_then(|m| parse_padding(m.as_str()));
        segments.push(Segment::Specifier(PatternSpecifier { flag, padding }));
      } else if caps.name("escaped").is_some() {
        segments.push(Segment::Literal("%".to_string()));
      }

      last_end = mat.end();
    }

    if last_end < pattern.len() {
      segments.push(Segment::Literal(pattern[last_end..].to_string()));
    }

    segments
  }

  /// Renders one flag into `content`. Color markers are handled by the caller.
  fn format_specifier(&self, content: &mut String, flag: char, record: &LogRecord) {
    if util::write_datetime_flag(content, flag, &record.timestamp) {
      return;
    }
    match flag {
      'v' => content.push_str(&record.message),
      'n' => content.push_str(&record.logger_name),
      'l' => content.push_str(record.level.long_name()),
      'L' => content.push_str(record.level.short_name()),
      't' => content.push_str(&record.thread_id),
      'P' => {
        let _ = write!(content, "{}", std::process::id());
      }
      '@' => {
        if let Some(location) = &record.location {
          let _ = write!(content, "{}:{}", location.file, location.line);
        }
      }
      's' => {
        if let Some(location) = &record.location {
          content.push_str(location.short_file());
        }
      }
      'g' => {
        if let Some(location) = &record.location {
          content.push_str(&location.file);
        }
      }
      '#' => {
        if let Some(location) = &record.location {
          let _ = write!(content, "{}", location.line);
        }
      }
      '!' => {
        if let Some(function) = record.location.as_ref().and_then(|l| l.function.as_deref()) {
          content.push_str(function);
        }
      }
      // Unknown flags are ignored.
      _ => {}
    }
  }
}

fn parse_padding(raw: &str) -> Option<(Align, usize)> {
  let (align, digits) = match raw.as_bytes().first() {
    Some(b'-') => (Align::Left, &raw[1..]),
    Some(b'=') => (Align::Center, &raw[1..]),
    _ => (Align::Right, raw),
  };
  digits.parse().ok().map(|width| (align, width))
}

/// Pads `content` to `width` characters, never truncating.
fn apply_padding(buf: &mut String, content: &str, align: Align, width: usize) {
  let _ = match align {
    Align::Right => write!(buf, "{:>width$}", content, width = width),
    Align::Left => write!(buf, "{:<width$}", content, width = width),
    Align::Center => write!(buf, "{:^width$}", content, width = width),
  };
}

impl RecordFormatter for PatternFormatter {
  fn format_record(&self, record: &LogRecord) -> FormattedRecord {
    let mut output = String::with_capacity(256);
    let mut color_start = None;
    let mut color_end = None;
    let mut content = String::with_capacity(64);

    for segment in &self.segments {
      match segment {
        Segment::Literal(text) => output.push_str(text),
        Segment::Specifier(spec) => match spec.flag {
          '^' => color_start = Some(output.len()),
          '$' => color_end = Some(output.len()),
          flag => match spec.padding {
            Some((align, width)) => {
              content.clear();
              self.format_specifier(&mut content, flag, record);
              apply_padding(&mut output, &content, align, width);
            }
            None => self.format_specifier(&mut output, flag, record),
          },
        },
      }
    }

    let color_range = color_start.map(|start| {
      let end = color_end.filter(|end| *end >= start).unwrap_or(output.len());
      start..end
    });

    output.push('\n');

    FormattedRecord {
      bytes: output.into_bytes(),
      color_range,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::entity::DEFAULT_PATTERN;
  use crate::model::{LogLevel, SourceLocation};
  use chrono::{Local, TimeZone, Timelike};
  use pretty_assertions::assert_eq;

  fn create_test_record() -> LogRecord {
    let mut record = LogRecord::new(LogLevel::Info, "app", "This is a test message.");
    record.timestamp = Local
      .with_ymd_and_hms(2023, 1, 1, 1, 1, 1)
      .unwrap()
      .with_nanosecond(42_000_000)
      .unwrap();
    record.thread_id = "7".to_string();
    record.location = Some(SourceLocation::new("src/net/server.rs", 88));
    record
  }

  fn render(pattern: &str) -> String {
    let formatter = PatternFormatter::new(pattern);
    formatter.format_record(&create_test_record()).as_str().into_owned()
  }

  #[test]
  fn format_with_default_pattern() {
    assert_eq!(
      render(DEFAULT_PATTERN),
      "2023-01-01 01:01:01,042 I [thread-7] app : This is a test message.\n"
    );
  }

  #[test]
  fn format_with_padding() {
    assert_eq!(render("[%8l] [%-5n] [%=7L]"), "[    info] [app  ] [   I   ]\n");
  }

  #[test]
  fn format_source_location() {
    assert_eq!(render("%s:%# (%@)"), "server.rs:88 (src/net/server.rs:88)\n");
  }

  #[test]
  fn format_handles_escaped_percent() {
    assert_eq!(render("100%% %l"), "100% info\n");
  }

  #[test]
  fn color_range_covers_marked_span() {
    let formatter = PatternFormatter::new("[%^%l%$] %v");
    let formatted = formatter.format_record(&create_test_record());
    assert_eq!(formatted.color_range, Some(1..5));
    assert_eq!(&formatted.bytes[1..5], b"info");
  }

  #[test]
  fn unterminated_color_runs_to_line_end() {
    let formatter = PatternFormatter::new("%^%v");
    let formatted = formatter.format_record(&create_test_record());
    assert_eq!(formatted.color_range, Some(0..formatted.len() - 1));
  }

  #[test]
  fn parse_handles_literals_and_specifiers() {
    let formatter = PatternFormatter::new("LITERAL %-10l AND %v");
    assert_eq!(formatter.segments.len(), 4);
    assert!(matches!(&formatter.segments[0], Segment::Literal(s) if s == "LITERAL "));
    assert!(matches!(
      &formatter.segments[1],
      Segment::Specifier(spec) if spec.flag == 'l' && spec.padding == Some((Align::Left, 10))
    ));
    assert!(matches!(&formatter.segments[2], Segment::Literal(s) if s == " AND "));
    assert!(matches!(
      &formatter.segments[3],
      Segment::Specifier(spec) if spec.flag == 'v' && spec.padding.is_none()
    ));
  }
}
