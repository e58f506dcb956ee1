//! Per-message orchestration of the extraction engine.
//!
//! [`Pipeline::process`] takes one [`RawMessage`] and returns the ordered,
//! deduplicated [`Article`] list for it:
//!
//! 1. Skip messages older than the freshness window, and messages that look
//!    like list mail (welcome, confirm, verify) rather than an issue.
//! 2. Classify the [`NewsletterSource`] from sender and subject.
//! 3. Run the HTML pass when there is an HTML body, then always run the text
//!    pass. HTML finds come first in the pooled list, in document order.
//! 4. Deduplicate once over the pool and stamp every survivor with the source
//!    and the message timestamp.
//!
//! A pipeline holds only immutable configuration, so one instance can be
//! shared (e.g. behind an `Arc`) by any number of concurrent tasks.
//!
//! # Examples
//!
//! ```ignore
//! let pipeline = Pipeline::new(ExtractionConfig::default())?;
//! let articles = pipeline.process(&message);
//! ```

use crate::classifier;
use crate::config::ExtractionConfig;
use crate::dedupe::dedupe;
use crate::dom::Document;
use crate::error::Result;
use crate::extractors::{ExtractContext, html::extract_html, text::extract_text};
use crate::models::{Article, NewsletterSource, RawMessage};
use crate::summary::Summarizer;
use crate::utils::{collapse_whitespace, haystack_contains, keyword_haystack, truncate_for_log};
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;
use tracing::{debug, info, instrument};

/// The extraction engine, configured once.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ExtractionConfig,
    summarizer: Summarizer,
}

impl Pipeline {
    /// Build a pipeline from `config`.
    ///
    /// # Errors
    ///
    /// Fails only when a configured promotional pattern is not a valid regex.
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let summarizer = Summarizer::new(&config.summary)?;
        Ok(Self { config, summarizer })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn context(&self) -> ExtractContext<'_> {
        ExtractContext {
            config: &self.config,
            summarizer: &self.summarizer,
        }
    }

    /// Messages older than `freshness_hours` are stale. Timestamps in the
    /// future are not. A window too large to represent never expires.
    pub fn is_stale(&self, message: &RawMessage, now: DateTime<Utc>) -> bool {
        match TimeDelta::try_hours(self.config.freshness_hours) {
            Some(window) => now.signed_duration_since(message.received_at) > window,
            None => false,
        }
    }

    /// Short message whose subject reads like list administration.
    pub fn looks_like_non_newsletter(&self, message: &RawMessage) -> bool {
        let rules = &self.config.non_newsletter;
        let subject = keyword_haystack(&message.subject);
        if !rules.subject_keywords.iter().any(|kw| haystack_contains(&subject, kw)) {
            return false;
        }
        visible_body_chars(message) < rules.min_body_chars
    }

    /// Extract articles from `message`, judged against the current time.
    pub fn process(&self, message: &RawMessage) -> Vec<Article> {
        self.process_at(message, Utc::now())
    }

    /// Extract articles from `message`, judging freshness against `now`.
    #[instrument(
        level = "info",
        skip_all,
        fields(subject = %truncate_for_log(&message.subject, 80), sender = %message.sender)
    )]
    pub fn process_at(&self, message: &RawMessage, now: DateTime<Utc>) -> Vec<Article> {
        if self.is_stale(message, now) {
            info!(received_at = %message.received_at, "Skipping stale message");
            return Vec::new();
        }
        if self.looks_like_non_newsletter(message) {
            info!("Skipping non-newsletter message");
            return Vec::new();
        }

        let source: NewsletterSource =
            classifier::classify_source(&message.sender, &message.subject, &self.config.sources);
        let ctx = self.context();

        let mut pooled = if message.html.trim().is_empty() {
            Vec::new()
        } else {
            extract_html(&message.html, &ctx)
        };
        let html_count = pooled.len();
        pooled.extend(extract_text(&message.text, &ctx));
        debug!(html = html_count, text = pooled.len() - html_count, "Pooled candidates");

        let articles: Vec<Article> = dedupe(pooled, self.config.similarity_threshold)
            .into_iter()
            .map(|candidate| candidate.into_article(source, message.received_at))
            .collect();
        info!(%source, count = articles.len(), "Message processed");
        articles
    }
}

/// Visible characters in the larger of the two bodies.
fn visible_body_chars(message: &RawMessage) -> usize {
    let text_chars = collapse_whitespace(&message.text).chars().count();
    let html_chars = if message.html.trim().is_empty() {
        0
    } else {
        collapse_whitespace(&Document::parse(&message.html).text())
            .chars()
            .count()
    };
    text_chars.max(html_chars)
}

/// Drop articles whose URL was already produced by an earlier message.
pub fn merge_across_messages(articles: impl IntoIterator<Item = Article>) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|article| article.url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-05-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tracking(dest: &str) -> String {
        format!(
            "https://tracking.tldrnewsletter.com/CL0/{}/1/0100018f4d0c1e9a-6a3f2b1c/Qm9vaw=352",
            urlencoding::encode(dest)
        )
    }

    fn scenario_html() -> String {
        format!(
            r#"<html><body><table><tr><td><a href="{}">Tool Launches New Feature (4 minute read)</a>. Also: signup link.</td></tr></table></body></html>"#,
            tracking("https://example.com/tool?utm_source=tldr")
        )
    }

    fn message(subject: &str, html: &str, text: &str) -> RawMessage {
        RawMessage {
            subject: subject.to_string(),
            sender: "TLDR <dan@tldrnewsletter.com>".to_string(),
            received_at: now() - TimeDelta::hours(1),
            html: html.to_string(),
            text: text.to_string(),
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_end_to_end_table_cell_scenario() {
        let msg = message("TLDR 2025-05-06", &scenario_html(), "");
        let articles = pipeline().process_at(&msg, now());

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.title, "Tool Launches New Feature");
        assert_eq!(article.read_time_minutes, Some(4));
        assert_eq!(article.url, "https://example.com/tool");
        assert!(!article.summary.to_lowercase().contains("signup"));
        assert_eq!(article.source, NewsletterSource::Tech);
        assert_eq!(article.received_at, msg.received_at);
    }

    #[test]
    fn test_stale_message_yields_nothing() {
        let mut msg = message("TLDR 2025-05-06", &scenario_html(), "");
        msg.received_at = now() - TimeDelta::hours(48);
        assert!(pipeline().process_at(&msg, now()).is_empty());
    }

    #[test]
    fn test_freshness_window_edges() {
        let pipeline = pipeline();
        let mut msg = message("TLDR", "", "");
        msg.received_at = now() - TimeDelta::hours(24);
        assert!(!pipeline.is_stale(&msg, now()));
        msg.received_at = now() - TimeDelta::hours(24) - TimeDelta::seconds(1);
        assert!(pipeline.is_stale(&msg, now()));
        msg.received_at = now() + TimeDelta::hours(3);
        assert!(!pipeline.is_stale(&msg, now()));
    }

    #[test]
    fn test_oversized_freshness_window_never_expires() {
        let mut config = ExtractionConfig::default();
        config.freshness_hours = i64::MAX / 2;
        let pipeline = Pipeline::new(config).unwrap();
        let mut msg = message("TLDR 2025-05-06", &scenario_html(), "");
        msg.received_at = now() - TimeDelta::days(3650);
        assert!(!pipeline.is_stale(&msg, now()));
        assert_eq!(pipeline.process_at(&msg, now()).len(), 1);
    }

    #[test]
    fn test_html_articles_in_document_order() {
        let html = format!(
            r#"<html><body>
               <table><tr><td><b>Alpha article appears first in document</b>
                 <a href="https://example.com/alpha">Read</a></td></tr></table>
               <p><a href="{}">Beta article appears second here</a></p>
               </body></html>"#,
            tracking("https://example.com/beta")
        );
        let msg = message("TLDR 2025-05-06", &html, "");
        let titles: Vec<String> = pipeline()
            .process_at(&msg, now())
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Alpha article appears first in document", "Beta article appears second here"]
        );
    }

    #[test]
    fn test_welcome_email_skipped() {
        let welcome = message("Welcome to TLDR! Please confirm your subscription", &scenario_html(), "");
        assert!(pipeline().looks_like_non_newsletter(&welcome));
        assert!(pipeline().process_at(&welcome, now()).is_empty());
    }

    #[test]
    fn test_long_body_with_keyword_subject_is_processed() {
        let filler = "<p>The weekly roundup of everything that happened in tech.</p>".repeat(30);
        let html = format!("{}{}", scenario_html(), filler);
        let msg = message("Welcome back: your weekly roundup", &html, "");
        assert!(!pipeline().looks_like_non_newsletter(&msg));
        assert_eq!(pipeline().process_at(&msg, now()).len(), 1);
    }

    #[test]
    fn test_html_first_then_new_text_articles() {
        let text = "Tool Launches New Feature (4 minute read)
https://example.com/tool

Database Startup Raises Big Round (2 minute read)
https://example.com/db
The company plans to hire more engineers this year.";
        let msg = message("TLDR 2025-05-06", &scenario_html(), text);
        let articles = pipeline().process_at(&msg, now());

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].url, "https://example.com/tool");
        assert_eq!(articles[0].provenance, Provenance::Html);
        assert_eq!(articles[1].url, "https://example.com/db");
        assert_eq!(articles[1].provenance, Provenance::Text);
    }

    #[test]
    fn test_text_only_message() {
        let text = "Database Startup Raises Big Round (2 minute read)
https://example.com/db
The company plans to hire more engineers this year.";
        let msg = message("TLDR Founders 2025-05-06", "", text);
        let articles = pipeline().process_at(&msg, now());
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, NewsletterSource::Founders);
    }

    #[test]
    fn test_empty_message_is_not_an_error() {
        let msg = message("TLDR 2025-05-06", "", "");
        assert!(pipeline().process_at(&msg, now()).is_empty());
    }

    #[test]
    fn test_source_attached_to_every_article() {
        let mut msg = message("OpenAI news", &scenario_html(), "");
        msg.sender = "TLDR AI <dan@tldrnewsletter.com>".to_string();
        let articles = pipeline().process_at(&msg, now());
        assert!(!articles.is_empty());
        assert!(articles.iter().all(|a| a.source == NewsletterSource::Ai));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ExtractionConfig::default();
        config.summary.promo_patterns.push("([".to_string());
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn test_merge_across_messages_keeps_first_url() {
        let first = message("TLDR", &scenario_html(), "");
        let mut second = message("TLDR AI", &scenario_html(), "");
        second.sender = "TLDR AI <dan@tldrnewsletter.com>".to_string();

        let pipeline = pipeline();
        let merged = merge_across_messages(
            pipeline
                .process_at(&first, now())
                .into_iter()
                .chain(pipeline.process_at(&second, now())),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, NewsletterSource::Tech);
    }
}
