//! Utility functions for dates, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Lenient parsing and display formatting of item dates
//! - Thumbnail URL construction
//! - String truncation for logging
//! - File system validation for output paths

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Parse an item date as sent by the API.
///
/// Accepted forms, tried in order:
/// - RFC 3339 (`2024-01-03T10:00:00Z`, `2024-01-03T10:00:00+02:00`)
/// - naive date-time, read as UTC (`2024-01-03T10:00:00`)
/// - bare date, read as midnight UTC (`2024-01-03`)
///
/// # Returns
///
/// `None` if the text matches none of the above.
pub fn parse_item_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format an item date for display, e.g. `January 3, 2024 at 10:00 AM`.
///
/// Unparseable dates are shown verbatim.
pub fn format_display_date(raw: &str) -> String {
    match parse_item_date(raw) {
        Some(dt) => dt.format("%B %-d, %Y at %-I:%M %p").to_string(),
        None => raw.to_string(),
    }
}

/// Build the public URL of a thumbnail from its storage key.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(thumbnail_url("/thumbnails", "a b.png"), "/thumbnails/a%20b.png");
/// ```
pub fn thumbnail_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(key)
    )
}

/// Backslash-escape Markdown punctuation in server-provided text.
///
/// ```ignore
/// assert_eq!(escape_markdown("[a](b)"), r"\[a\]\(b\)");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '\\' | '`' | '*' | '_' | '[' | ']' | '(' | ')' | '#' | '!' | '<' | '>' | '|'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and a count of the dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure the parent directory of an output file exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or written to.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}
