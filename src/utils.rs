//! Utility functions for timestamps, links, text and the file system.
//!
//! This module provides helper functions used throughout the application:
//! - Publication timestamp parsing and display formatting
//! - Resolving article links against the site root
//! - HTML escaping and whitespace collapsing
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, NaiveDateTime, Utc};
use std::borrow::Cow;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Parse an ISO-8601 publication timestamp.
///
/// Offsets are honoured; a trailing `Z` means UTC, and a timestamp with no
/// offset at all is taken to be UTC as well.
///
/// # Returns
///
/// `None` if the string is not a recognizable timestamp.
///
/// # Examples
///
/// ```ignore
/// assert!(parse_published("2025-05-06T14:30:00Z").is_some());
/// assert!(parse_published("2025-05-06T14:30:00").is_some());
/// assert!(parse_published("yesterday").is_none());
/// ```
pub fn parse_published(iso: &str) -> Option<DateTime<Utc>> {
    let iso = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(iso, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Human-readable date for cards, e.g. `May 6, 2025`.
pub fn display_date(dt: &DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}

/// Resolve an article link against the site root.
///
/// Absolute links pass through untouched. Relative links are joined to the
/// root with exactly one slash between them.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(join_site_root("/", "articles/a.html"), "/articles/a.html");
/// assert_eq!(join_site_root("https://x.com", "/articles/a.html"), "https://x.com/articles/a.html");
/// ```
pub fn join_site_root(site_root: &str, link: &str) -> String {
    if Url::parse(link).is_ok() {
        return link.to_string();
    }
    format!(
        "{}/{}",
        site_root.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn escape_html(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
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

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A feed cut off mid-transfer fails with an EOF error; this lets the
/// fetcher log that case distinctly from a genuinely malformed document.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
