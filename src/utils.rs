//! Utility functions for text truncation and date formatting.
//!
//! This module provides helper functions used throughout the service:
//! - Character-safe truncation for extracted fields and log previews
//! - `YYYY-MM-DD` formatting of the server's local date

use chrono::{Local, NaiveDate};

/// Format used for every date the service returns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keep at most `max` characters of `s`.
///
/// Counts Unicode scalar values rather than bytes, so multi-byte text is
/// never split inside a code point.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Returns
///
/// The original string if it has at most `max` characters, otherwise a
/// truncated version with `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The server's local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_string() {
        assert_eq!(truncate_chars("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_chars_exact_length() {
        let s = "a".repeat(150);
        assert_eq!(truncate_chars(&s, 150), s);
    }

    #[test]
    fn test_truncate_chars_long_string() {
        let s = "b".repeat(300);
        let result = truncate_chars(&s, 150);
        assert_eq!(result.chars().count(), 150);
        assert_eq!(result, "b".repeat(150));
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        let s = "नमस्ते दुनिया";
        let result = truncate_chars(s, 3);
        assert_eq!(result.chars().count(), 3);
        assert!(s.starts_with(&result));
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(format_date(date), "2024-06-05");
    }

    #[test]
    fn test_local_today_round_trips_through_format() {
        let today = format_date(local_today());
        assert!(NaiveDate::parse_from_str(&today, DATE_FORMAT).is_ok());
    }
}
