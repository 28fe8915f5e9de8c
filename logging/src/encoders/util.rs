// src/encoders/util.rs
// Date and time rendering for the pattern formatter.

use chrono::{DateTime, Local, Timelike};
use std::fmt::Write;

/// Renders one date/time flag. Returns false if `flag` is not a date/time flag.
pub fn write_datetime_flag(buf: &mut String, flag: char, timestamp: &DateTime<Local>) -> bool {
  let format = match flag {
    'Y' => "%Y",
    'y' | 'C' => "%y",
    'm' => "%m",
    'd' => "%d",
    'H' => "%H",
    'M' => "%M",
    'S' => "%S",
    'I' => "%I",
    'p' => "%p",
    'a' => "%a",
    'A' => "%A",
    'b' | 'h' => "%b",
    'B' => "%B",
    'D' | 'x' => "%m/%d/%y",
    'c' => "%a %b %d %H:%M:%S %Y",
    'r' => "%I:%M:%S %p",
    'R' => "%H:%M",
    'T' | 'X' => "%H:%M:%S",
    'z' => "%:z",
    'e' => return write_subsec(buf, timestamp, 3),
    'f' => return write_subsec(buf, timestamp, 6),
    'F' => return write_subsec(buf, timestamp, 9),
    'E' => {
      let _ = write!(buf, "{}", timestamp.timestamp());
      return true;
    }
    _ => return false,
  };
  let _ = write!(buf, "{}", timestamp.format(format));
  true
}

/// Fraction of the current second, zero padded to `digits` (3, 6 or 9).
fn write_subsec(buf: &mut String, timestamp: &DateTime<Local>, digits: usize) -> bool {
  // Leap seconds are reported as nanos >= 1e9.
  let nanos = timestamp.nanosecond() % 1_000_000_000;
  let value = nanos / 10u32.pow(9 - digits as u32);
  let _ = write!(buf, "{:0width$}", value, width = digits);
  true
}
