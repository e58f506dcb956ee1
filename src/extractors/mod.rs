//! Extraction passes that turn message bodies into article candidates.
//!
//! Each pass is an ordered list of independent strategies with a uniform
//! signature. A pass runs every strategy and pools the results in document
//! order, with strategy order breaking ties. Deduplication happens later,
//! once, over everything the message produced.
//!
//! | Pass | Module | Strategies |
//! |------|--------|------------|
//! | HTML | [`html`] | anchor sweep, table-cell sweep, bold sweep |
//! | Text | [`text`] | read-time line sweep |
//!
//! Every strategy funnels its raw finds through [`build_candidate`], which
//! resolves the link, classifies the surrounding block and normalizes the
//! summary. A candidate that fails any step is dropped on its own; nothing
//! here aborts a whole message.

pub mod html;
pub mod text;

use crate::classifier::{self, Classification};
use crate::config::ExtractionConfig;
use crate::models::{ArticleCandidate, LinkCandidate};
use crate::resolver;
use crate::summary::Summarizer;
use crate::utils::{collapse_whitespace, strip_control_chars, truncate_for_log};
use tracing::debug;

/// Everything a strategy needs besides the document itself.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub config: &'a ExtractionConfig,
    pub summarizer: &'a Summarizer,
}

/// Title text as it should be stored: no control characters, no read-time
/// marker, collapsed whitespace, no dangling separators.
pub fn clean_title(raw: &str) -> String {
    let text = collapse_whitespace(&strip_control_chars(&classifier::strip_read_time(raw)));
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | '·' | '•'))
        .to_string()
}

/// The part of `block` that follows the first occurrence of `title`
/// (case-insensitive), or all of `block` when the title is not in it.
pub fn text_after_title<'b>(block: &'b str, title: &str) -> &'b str {
    if title.is_empty() {
        return block;
    }
    let lowered = block.to_lowercase();
    // Lowercasing can change byte lengths; only trust the offset if it maps back cleanly
    match lowered.find(&title.to_lowercase()) {
        Some(pos) if lowered.len() == block.len() => block.get(pos + title.len()..).unwrap_or(block),
        _ => block,
    }
}

/// Resolve, classify and summarize one raw find.
///
/// `body` is the raw text the summary is built from. Returns `None` when the
/// link does not resolve or the classifier rejects the block.
pub fn build_candidate(
    link: &LinkCandidate,
    title: &str,
    body: &str,
    ctx: &ExtractContext<'_>,
) -> Option<ArticleCandidate> {
    let Some(url) = resolver::resolve(&link.href, &ctx.config.resolver) else {
        debug!(href = %truncate_for_log(&link.href, 120), "Link did not resolve");
        return None;
    };

    let label = classifier::classify(title, &url, &link.surrounding_text, link.provenance, ctx.config);
    if label != Classification::Accept {
        debug!(?label, %title, %url, "Candidate rejected");
        return None;
    }

    let read_time_minutes = classifier::read_time_minutes(&link.anchor_text)
        .or_else(|| classifier::read_time_minutes(&link.surrounding_text));
    let summary = ctx.summarizer.normalize(&classifier::strip_read_time(body));
    let category = classifier::detect_topic(&format!("{} {}", title, summary), &ctx.config.topics);

    Some(ArticleCandidate {
        title: title.to_string(),
        summary,
        url,
        category,
        read_time_minutes,
        provenance: link.provenance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;

    fn with_ctx<T>(f: impl FnOnce(&ExtractContext<'_>) -> T) -> T {
        let config = ExtractionConfig::default();
        let summarizer = Summarizer::new(&config.summary).unwrap();
        f(&ExtractContext {
            config: &config,
            summarizer: &summarizer,
        })
    }

    fn link(href: &str, anchor: &str, surrounding: &str) -> LinkCandidate {
        LinkCandidate {
            href: href.to_string(),
            anchor_text: anchor.to_string(),
            surrounding_text: surrounding.to_string(),
            provenance: Provenance::Html,
        }
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Tool Launches\n New Feature (4 minute read) "), "Tool Launches New Feature");
        assert_eq!(clean_title("Big News:"), "Big News");
        assert_eq!(clean_title("• Bullet\u{0007} item"), "Bullet item");
    }

    #[test]
    fn test_text_after_title() {
        let block = "Tool Launches New Feature (4 minute read). Also: signup link.";
        assert_eq!(
            text_after_title(block, "tool launches new feature"),
            " (4 minute read). Also: signup link."
        );
        assert_eq!(text_after_title(block, "Missing"), block);
        assert_eq!(text_after_title(block, ""), block);
    }

    #[test]
    fn test_build_candidate_accepts_article() {
        let candidate = with_ctx(|ctx| {
            build_candidate(
                &link(
                    "https://example.com/rust?utm_source=news",
                    "Rust compiler gets faster",
                    "Rust compiler gets faster (5 minute read) The compiler team has shipped a new backend.",
                ),
                "Rust compiler gets faster",
                " (5 minute read) The compiler team has shipped a new backend.",
                ctx,
            )
        })
        .unwrap();

        assert_eq!(candidate.url, "https://example.com/rust");
        assert_eq!(candidate.read_time_minutes, Some(5));
        assert_eq!(candidate.summary, "The compiler team has shipped a new backend.");
        assert_eq!(candidate.category, Some(crate::models::TopicCategory::Programming));
    }

    #[test]
    fn test_build_candidate_rejects_unresolvable_link() {
        let candidate = with_ctx(|ctx| {
            build_candidate(&link("/relative", "A real title", ""), "A real title", "", ctx)
        });
        assert!(candidate.is_none());
    }

    #[test]
    fn test_build_candidate_rejects_sponsor_block() {
        let candidate = with_ctx(|ctx| {
            build_candidate(
                &link("https://acme.com", "Acme Cloud", "Acme Cloud. Sponsored by Acme"),
                "Acme Cloud",
                "Sponsored by Acme",
                ctx,
            )
        });
        assert!(candidate.is_none());
    }
}
