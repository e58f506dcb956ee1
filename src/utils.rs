//! Utility functions for string cleanup, keyword matching, time classification
//! and file system checks.
//!
//! This module provides helper functions used throughout the crate:
//! - Whitespace collapsing, control-character stripping and word-boundary truncation
//! - Token-based keyword matching for the rule tables
//! - Time classification for edition naming
//! - String truncation for logging
//! - File system validation for output directories
//! - Reading message files for the batch runner

use crate::models::RawMessage;
use chrono::{Local, NaiveTime};
use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument};

/// The single-character marker appended to anything we shorten.
pub const ELLIPSIS: char = '…';

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove control characters (including zero-width formatting marks that
/// mail clients use as preheader padding).
pub fn strip_control_chars(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() && !matches!(c, '\u{200B}'..='\u{200F}' | '\u{FEFF}' | '\u{034F}'))
        .collect()
}

/// Shorten `s` to at most `max_chars` characters, cutting at the last word
/// boundary that fits and appending [`ELLIPSIS`].
///
/// Strings that already fit are returned unchanged. The ellipsis counts
/// toward `max_chars`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_at_word_boundary("hello big world", 12), "hello big…");
/// assert_eq!(truncate_at_word_boundary("short", 10), "short");
/// ```
pub fn truncate_at_word_boundary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let budget = max_chars - 1;
    let cut = s
        .char_indices()
        .nth(budget)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let head = &s[..cut];
    // Only back up to a space if the cut landed inside a word
    let next_is_space = s[cut..].starts_with(char::is_whitespace);
    let head = match head.rfind(char::is_whitespace) {
        Some(space) if !next_is_space && space > 0 => &head[..space],
        _ => head,
    };
    let head = head.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':'));
    format!("{}{}", head, ELLIPSIS)
}

/// Lowercase `s` and reduce it to space-separated alphanumeric tokens,
/// padded with a space at each end so that `" kw "` lookups match whole words.
///
/// Hyphens separate tokens like any other punctuation, so `sign-up` and
/// `sign up` produce the same haystack.
pub fn keyword_haystack(s: &str) -> String {
    let lowered = s.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    format!(" {} ", tokens.join(" "))
}

/// Whole-word (or whole-phrase) keyword test against a [`keyword_haystack`].
pub fn haystack_contains(haystack: &str, keyword: &str) -> bool {
    let needle = keyword_haystack(keyword);
    !needle.trim().is_empty() && haystack.contains(&needle)
}

/// Like [`haystack_contains`], but the last word of `keyword` may carry a
/// suffix (`sponsor` matches `sponsors` and `sponsorship`).
pub fn haystack_contains_prefix(haystack: &str, keyword: &str) -> bool {
    let needle = keyword_haystack(keyword);
    let needle = needle.trim_end();
    !needle.trim().is_empty() && haystack.contains(needle)
}

/// Classify current time into morning, afternoon, or evening.
///
/// Used to name the output edition. The time boundaries are:
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
#[instrument]
pub fn time_of_day() -> String {
    classify_time_of_day(Local::now().time()).to_string()
}

fn classify_time_of_day(tod: NaiveTime) -> &'static str {
    let morning_high = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN);
    let afternoon_high = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN);

    let which = if tod < morning_high {
        "morning"
    } else if tod < afternoon_high {
        "afternoon"
    } else {
        "evening"
    };
    debug!(%tod, %which, "Computed time_of_day");
    which
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Capitalize the first character of a string.
///
/// Used for headings in the Markdown digest (e.g., "morning" -> "Morning").
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
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
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
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

/// Expand the CLI inputs into message files.
///
/// Directories contribute their `*.json` entries in name order; plain paths
/// are taken as given.
#[instrument(level = "info", skip_all, fields(inputs = inputs.len()))]
pub async fn collect_message_files(inputs: &[String]) -> crate::error::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = PathBuf::from(input);
        if !fs::metadata(&path).await?.is_dir() {
            files.push(path);
            continue;
        }
        let mut entries = fs::read_dir(&path).await?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file = entry.path();
            if file.extension().is_some_and(|ext| ext == "json") {
                found.push(file);
            }
        }
        found.sort();
        debug!(dir = %path.display(), count = found.len(), "Found message files");
        files.extend(found);
    }
    Ok(files)
}

/// Read one [`RawMessage`] from a JSON file.
pub async fn read_message(path: &Path) -> crate::error::Result<RawMessage> {
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
