//! Data models for newsletter messages and the articles extracted from them.
//!
//! This module defines the core data structures used throughout the engine:
//! - [`RawMessage`]: One newsletter email as handed over by mail intake
//! - [`LinkCandidate`]: A hyperlink seen while walking a message body
//! - [`ArticleCandidate`]: A tentative article produced by an extraction pass
//! - [`Article`]: A surviving candidate stamped with its newsletter source
//! - [`Digest`]: Collection of articles for a single run of the binary
//!
//! Enum tags serialize in lowercase / kebab-case so downstream consumers can
//! use them directly as index facets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A raw newsletter message as delivered by the mail-intake collaborator.
///
/// Immutable for the duration of one pipeline run. Either body may be empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawMessage {
    /// The message subject line.
    pub subject: String,
    /// The `From` header, e.g. `"TLDR AI <dan@tldrnewsletter.com>"`.
    pub sender: String,
    /// When the message was received.
    #[serde(alias = "receivedAt")]
    pub received_at: DateTime<Utc>,
    /// The `text/html` part, or empty.
    #[serde(default)]
    pub html: String,
    /// The `text/plain` part, or empty.
    #[serde(default)]
    pub text: String,
}

/// Which extraction pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Html,
    Text,
}

/// A hyperlink observed while walking a document, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// The raw link target exactly as written in the message.
    pub href: String,
    /// Visible text of the link (or the line that names it, for plaintext).
    pub anchor_text: String,
    /// Text of the enclosing block, used for sponsor detection and summaries.
    pub surrounding_text: String,
    pub provenance: Provenance,
}

/// Topic tag assigned by keyword match against title and summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicCategory {
    Ai,
    BigTech,
    Startups,
    Programming,
    Science,
    Security,
}

/// Which newsletter edition a message belongs to.
///
/// Derived once per message from sender and subject; `Tech` is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsletterSource {
    #[default]
    Tech,
    Ai,
    Crypto,
    Webdev,
    Founders,
    Marketing,
    Design,
    Devops,
    Security,
}

impl fmt::Display for NewsletterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NewsletterSource::Tech => "tech",
            NewsletterSource::Ai => "ai",
            NewsletterSource::Crypto => "crypto",
            NewsletterSource::Webdev => "webdev",
            NewsletterSource::Founders => "founders",
            NewsletterSource::Marketing => "marketing",
            NewsletterSource::Design => "design",
            NewsletterSource::Devops => "devops",
            NewsletterSource::Security => "security",
        };
        f.write_str(name)
    }
}

/// A tentative article produced by one extraction pass.
///
/// # Invariants
///
/// - `url` is an absolute, resolved, non-tracking, non-blocklisted http(s) URL
/// - `title` has no control characters and is not an administrative phrase
/// - `summary` is bounded by the configured cap and ends with `…` if truncated
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleCandidate {
    pub title: String,
    pub summary: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TopicCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time_minutes: Option<u32>,
    pub provenance: Provenance,
}

impl ArticleCandidate {
    /// Stamp the candidate with the message-level metadata.
    pub fn into_article(self, source: NewsletterSource, received_at: DateTime<Utc>) -> Article {
        Article {
            title: self.title,
            summary: self.summary,
            url: self.url,
            category: self.category,
            read_time_minutes: self.read_time_minutes,
            provenance: self.provenance,
            source,
            received_at,
        }
    }
}

/// The final output record handed to embedding, persistence and indexing.
///
/// Downstream stores treat `url` as the natural deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<TopicCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time_minutes: Option<u32>,
    pub provenance: Provenance,
    pub source: NewsletterSource,
    pub received_at: DateTime<Utc>,
}

/// All articles gathered by one run of the binary.
///
/// # Edition Naming
///
/// The `time_of_day` field categorizes runs as:
/// - `"morning"`: 00:00 - 08:00
/// - `"afternoon"`: 08:00 - 16:00
/// - `"evening"`: 16:00 - 24:00
#[derive(Debug, Deserialize, Serialize)]
pub struct Digest {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The time of day category: "morning", "afternoon", or "evening".
    pub time_of_day: String,
    /// How many message files were read.
    pub messages_seen: usize,
    /// The deduplicated articles, in message then document order.
    pub articles: Vec<Article>,
}
