//! JSON output for downstream collaborators.
//!
//! The [`Digest`] is serialized as-is, so consumers (embedding, persistence,
//! search indexing) read the same field names the models define.
//!
//! # Output Structure
//!
//! Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! A second run in the same edition overwrites the earlier file.

use crate::error::Result;
use crate::models::Digest;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the JSON file for `digest` under `json_output_dir`.
pub fn digest_path(digest: &Digest, json_output_dir: &str) -> PathBuf {
    Path::new(json_output_dir)
        .join(&digest.local_date)
        .join(format!("{}.json", digest.time_of_day))
}

/// Write a [`Digest`] to `{json_output_dir}/{date}/{time_of_day}.json`.
///
/// Creates the date directory when missing and returns the written path.
///
/// # Errors
///
/// Fails if serialization, directory creation or the write itself fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(digest: &Digest, json_output_dir: &str) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(digest)?;
    let path = digest_path(digest, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = digest.articles.len(), "Wrote JSON digest");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, NewsletterSource, Provenance};
    use chrono::{TimeZone, Utc};

    fn digest() -> Digest {
        Digest {
            local_date: "2025-05-06".to_string(),
            time_of_day: "morning".to_string(),
            messages_seen: 1,
            articles: vec![Article {
                title: "Tool Launches New Feature".to_string(),
                summary: "The tool now supports plugins for every editor.".to_string(),
                url: "https://example.com/tool".to_string(),
                category: None,
                read_time_minutes: Some(4),
                provenance: Provenance::Html,
                source: NewsletterSource::Tech,
                received_at: Utc.with_ymd_and_hms(2025, 5, 6, 6, 30, 0).unwrap(),
            }],
        }
    }

    #[test]
    fn test_digest_path() {
        let path = digest_path(&digest(), "/srv/json");
        assert_eq!(path, PathBuf::from("/srv/json/2025-05-06/morning.json"));
    }

    #[tokio::test]
    async fn test_write_digest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().to_str().unwrap();

        let path = write_digest(&digest(), out_dir).await.unwrap();
        assert!(path.ends_with("2025-05-06/morning.json"));

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let back: Digest = serde_json::from_str(&written).unwrap();
        assert_eq!(back.articles, digest().articles);
        assert!(written.contains("\"read_time_minutes\": 4"));
        assert!(!written.contains("\"category\""));
    }

    #[tokio::test]
    async fn test_write_digest_overwrites_same_edition() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().to_str().unwrap();

        write_digest(&digest(), out_dir).await.unwrap();
        let mut empty = digest();
        empty.articles.clear();
        let path = write_digest(&empty, out_dir).await.unwrap();

        let back: Digest = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert!(back.articles.is_empty());
    }
}
