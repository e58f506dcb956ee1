//! Markdown reading list.
//!
//! Renders a [`Digest`] as one Markdown page, grouped first by newsletter
//! source and then by topic:
//!
//! ```text
//! # Morning Digest, 2025-05-06
//!
//! ## Ai
//!
//! ### Programming
//!
//! - [Rust compiler gets faster](https://example.com/rust) *(5 min read)*
//!   The compiler team has shipped a new backend.
//! ```
//!
//! Sources and topics are listed alphabetically; articles keep digest order.

use crate::error::Result;
use crate::models::{Article, Digest, TopicCategory};
use crate::utils::upcase;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

fn topic_label(category: Option<TopicCategory>) -> &'static str {
    match category {
        Some(TopicCategory::Ai) => "AI",
        Some(TopicCategory::BigTech) => "Big Tech",
        Some(TopicCategory::Startups) => "Startups",
        Some(TopicCategory::Programming) => "Programming",
        Some(TopicCategory::Science) => "Science",
        Some(TopicCategory::Security) => "Security",
        None => "Other",
    }
}

/// Square brackets in a title would end the link text early.
fn escape_link_text(title: &str) -> String {
    title.replace('[', "\\[").replace(']', "\\]")
}

fn render_article(md: &mut String, article: &Article) {
    md.push_str(&format!("- [{}]({})", escape_link_text(&article.title), article.url));
    if let Some(minutes) = article.read_time_minutes {
        md.push_str(&format!(" *({} min read)*", minutes));
    }
    md.push('\n');
    if !article.summary.is_empty() {
        md.push_str(&format!("  {}\n", article.summary));
    }
}

/// Render `digest` as a Markdown reading list.
pub fn digest_to_markdown(digest: &Digest) -> String {
    let mut md = format!(
        "# {} Digest, {}\n\n_{} articles from {} messages_\n",
        upcase(&digest.time_of_day),
        digest.local_date,
        digest.articles.len(),
        digest.messages_seen
    );

    let mut by_source: BTreeMap<String, BTreeMap<&'static str, Vec<&Article>>> = BTreeMap::new();
    for article in &digest.articles {
        by_source
            .entry(article.source.to_string())
            .or_default()
            .entry(topic_label(article.category))
            .or_default()
            .push(article);
    }

    for (source, topics) in &by_source {
        md.push_str(&format!("\n## {}\n", upcase(source)));
        for (topic, articles) in topics {
            md.push_str(&format!("\n### {}\n\n", topic));
            for article in articles {
                render_article(&mut md, article);
            }
        }
    }
    md
}

/// Write the reading list to `{markdown_output_dir}/{date}_{time_of_day}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir, date = %digest.local_date))]
pub async fn write_markdown(digest: &Digest, markdown_output_dir: &str) -> Result<PathBuf> {
    fs::create_dir_all(markdown_output_dir).await?;
    let path = Path::new(markdown_output_dir)
        .join(format!("{}_{}.md", digest.local_date, digest.time_of_day));
    fs::write(&path, digest_to_markdown(digest)).await?;
    info!(path = %path.display(), "Wrote Markdown reading list");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsletterSource, Provenance};
    use chrono::{TimeZone, Utc};

    fn article(title: &str, source: NewsletterSource, category: Option<TopicCategory>) -> Article {
        Article {
            title: title.to_string(),
            summary: format!("Summary of {}.", title),
            url: format!("https://example.com/{}", title.len()),
            category,
            read_time_minutes: Some(3),
            provenance: Provenance::Html,
            source,
            received_at: Utc.with_ymd_and_hms(2025, 5, 6, 6, 30, 0).unwrap(),
        }
    }

    fn digest(articles: Vec<Article>) -> Digest {
        Digest {
            local_date: "2025-05-06".to_string(),
            time_of_day: "morning".to_string(),
            messages_seen: 2,
            articles,
        }
    }

    #[test]
    fn test_grouping_by_source_then_topic() {
        let md = digest_to_markdown(&digest(vec![
            article("Rust compiler gets faster", NewsletterSource::Tech, Some(TopicCategory::Programming)),
            article("OpenAI ships a model", NewsletterSource::Ai, Some(TopicCategory::Ai)),
            article("Misc story", NewsletterSource::Tech, None),
        ]));

        assert!(md.starts_with("# Morning Digest, 2025-05-06\n"));
        assert!(md.contains("_3 articles from 2 messages_"));

        let ai = md.find("## Ai").unwrap();
        let tech = md.find("## Tech").unwrap();
        assert!(ai < tech);

        let other = md.find("### Other").unwrap();
        let programming = md.find("### Programming").unwrap();
        assert!(tech < other && other < programming);
        assert!(md.contains("- [Rust compiler gets faster](https://example.com/25) *(3 min read)*\n"));
        assert!(md.contains("  Summary of Misc story.\n"));
    }

    #[test]
    fn test_brackets_in_titles_are_escaped() {
        let md = digest_to_markdown(&digest(vec![article(
            "Show HN: [beta] tool",
            NewsletterSource::Tech,
            None,
        )]));
        assert!(md.contains(r"[Show HN: \[beta\] tool]"));
    }

    #[test]
    fn test_empty_digest() {
        let md = digest_to_markdown(&digest(Vec::new()));
        assert!(md.contains("_0 articles from 2 messages_"));
        assert!(!md.contains("##"));
    }

    #[tokio::test]
    async fn test_write_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().to_str().unwrap();
        let path = write_markdown(&digest(Vec::new()), out_dir).await.unwrap();
        assert!(path.ends_with("2025-05-06_morning.md"));
        assert!(tokio::fs::read_to_string(&path).await.unwrap().starts_with("# Morning Digest"));
    }
}
