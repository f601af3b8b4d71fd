//! Small helpers shared across the pipeline.
//!
//! - Logging helpers (`truncate_for_log`)
//! - Integer-prefix count parsing for scraped text
//! - Day keys (`YYYYMMDD`) used by the aggregator's day sections
//! - HTML escaping for the renderer
//! - File system validation for the digest output path

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static LEADING_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(\d+)").unwrap());
static DAY_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing off to a char boundary) with
/// an ellipsis and a count of the dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Parse a scraped count such as `"123"`, `"123 points"` or `" 7 comments"`.
///
/// Only a leading run of digits counts. Text without one (ads, "discuss",
/// broken markup) yields `None` so the caller can drop the row rather than
/// pretend it scored zero.
pub fn parse_count(text: &str) -> Option<u64> {
    LEADING_COUNT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse an 8-digit `YYYYMMDD` day key into a calendar date.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    let caps = DAY_KEY.captures(key.trim())?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Encode a date as its numeric `YYYYMMDD` day key.
pub fn day_key(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// Escape text for use inside HTML element content or a quoted attribute.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and removes a
/// probe file to confirm write access.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    // A small sync write keeps the error surface simple
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundary() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("123"), Some(123));
        assert_eq!(parse_count("  45 points"), Some(45));
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("discuss"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("-3"), None);
    }

    #[test]
    fn test_parse_day_key() {
        assert_eq!(
            parse_day_key("20261016"),
            NaiveDate::from_ymd_opt(2026, 10, 16)
        );
        assert_eq!(parse_day_key("20260230"), None);
        assert_eq!(parse_day_key("2026-10-16"), None);
        assert_eq!(parse_day_key("main"), None);
        assert_eq!(parse_day_key(""), None);
    }

    #[test]
    fn test_day_key_roundtrip_ordering() {
        let earlier = NaiveDate::from_ymd_opt(2026, 9, 30).unwrap();
        let later = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        assert_eq!(day_key(earlier), 20260930);
        assert!(day_key(earlier) < day_key(later));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("digests/2026");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
