//! Lexical forms for Flux literals.
//!
//! Flux requires exact spellings: string literals are double quoted with
//! backslash escapes, durations are an integer magnitude plus a unit suffix,
//! floats always carry a decimal point, and timestamps are RFC 3339 with
//! nanosecond precision. Everything here is locale independent by
//! construction.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Units accepted by Flux duration literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    /// The suffix spelled after the magnitude, e.g. `m` in `-15m`.
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Microseconds => "us",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Seconds => "s",
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Inserts one backslash before every quote or backslash in `raw`.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes `raw` and wraps it in double quotes, yielding a complete Flux
/// string literal.
pub fn quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    out.push_str(&escape_string(raw));
    out.push('"');
    out
}

/// Renders a duration literal such as `-1h` or `30s`.
pub fn format_duration(amount: i64, unit: TimeUnit) -> String {
    format!("{}{}", amount, unit.suffix())
}

/// Renders a float with an explicit decimal point, e.g. `5.0` rather than
/// `5`, which Flux would otherwise read as an integer.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

/// Renders an RFC 3339 timestamp with nanosecond precision.
pub fn format_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_escape_inserts_single_backslash_per_quote() {
        assert_eq!(escape_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_string(r"back\slash"), r"back\\slash");
        assert_eq!(escape_string("plain"), "plain");
    }

    #[test]
    fn test_quoted_wraps_and_escapes() {
        assert_eq!(quoted("telegraf"), "\"telegraf\"");
        assert_eq!(quoted(r#"a "b" c"#), r#""a \"b\" c""#);
    }

    #[test]
    fn test_quoted_round_trips_through_literal_grammar() {
        let raw = r#"he said "1\2""#;
        let literal = quoted(raw);

        // Unquote and unescape the way a Flux lexer would.
        let inner = &literal[1..literal.len() - 1];
        let mut recovered = String::new();
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                recovered.extend(chars.next());
            } else {
                recovered.push(ch);
            }
        }
        assert_eq!(recovered, raw);
    }

    #[test]
    fn test_duration_suffixes() {
        assert_eq!(format_duration(-1, TimeUnit::Hours), "-1h");
        assert_eq!(format_duration(30, TimeUnit::Seconds), "30s");
        assert_eq!(format_duration(15, TimeUnit::Nanoseconds), "15ns");
        assert_eq!(format_duration(2, TimeUnit::Weeks), "2w");
        assert_eq!(format_duration(100, TimeUnit::Microseconds), "100us");
    }

    #[test]
    fn test_float_keeps_decimal_point() {
        assert_eq!(format_float(5.0), "5.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-0.25), "-0.25");
    }

    #[test]
    fn test_time_renders_nanoseconds() {
        let t = Utc.timestamp_opt(0, 1).unwrap();
        assert_eq!(format_time(&t), "1970-01-01T00:00:00.000000001Z");
    }
}
