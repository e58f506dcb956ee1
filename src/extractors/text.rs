//! Plaintext extraction pass.
//!
//! Newsletter plaintext parts mark every article with a read-time suffix:
//!
//! ```text
//! OpenAI Ships New Model (3 minute read)
//! https://tracking.tldrnewsletter.com/CL0/https:%2F%2Fopenai.com%2F.../1/...
//! The new model is faster and cheaper than its predecessor.
//! ```
//!
//! Some senders cite links as footnotes instead (`Title (3 minute read) [4]`
//! with a `[4] https://…` list at the bottom). Both layouts are handled by the
//! single read-time line sweep below. This pass always runs, even when the
//! HTML pass already found articles.

use super::{ExtractContext, build_candidate, clean_title};
use crate::classifier;
use crate::models::{ArticleCandidate, LinkCandidate, Provenance};
use crate::resolver;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, instrument};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s<>()\[\]"']+"#).expect("URL_RE should compile"));

/// `[4] https://example.com/post`
static FOOTNOTE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\[(\d{1,4})\]\s*(https?://\S+)\s*$").expect("FOOTNOTE_LINE_RE should compile")
});

static FOOTNOTE_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,4})\]").expect("FOOTNOTE_REF_RE should compile"));

/// Lines searched for a URL on either side of the title line.
const URL_WINDOW: usize = 2;
/// Summary collection stops once this many characters are gathered.
const SUMMARY_CHARS: usize = 200;
const MAX_SUMMARY_LINES: usize = 6;

/// A named plaintext strategy.
pub struct TextStrategy {
    pub name: &'static str,
    pub run: fn(&str, &ExtractContext<'_>) -> Vec<ArticleCandidate>,
}

pub const TEXT_STRATEGIES: &[TextStrategy] = &[TextStrategy {
    name: "read_time_lines",
    run: read_time_lines,
}];

/// Run every plaintext strategy over `text` and pool the results.
#[instrument(level = "debug", skip_all, fields(bytes = text.len()))]
pub fn extract_text(text: &str, ctx: &ExtractContext<'_>) -> Vec<ArticleCandidate> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let mut pooled = Vec::new();
    for strategy in TEXT_STRATEGIES {
        let found = (strategy.run)(text, ctx);
        debug!(strategy = strategy.name, count = found.len(), "Text strategy finished");
        pooled.extend(found);
    }
    pooled
}

fn inline_urls(line: &str) -> impl Iterator<Item = &str> + '_ {
    URL_RE
        .find_iter(line)
        .map(|m| m.as_str().trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '!' | '?')))
}

/// `line` without URLs and footnote references.
fn strip_links(line: &str) -> String {
    let without_refs = FOOTNOTE_REF_RE.replace_all(line, " ");
    collapse(&URL_RE.replace_all(&without_refs, " "))
}

fn collapse(s: &str) -> String {
    crate::utils::collapse_whitespace(s)
}

/// Lines that only carry links or separators (`------`).
fn is_link_only(line: &str) -> bool {
    FOOTNOTE_LINE_RE.is_match(line) || !strip_links(line).chars().any(char::is_alphanumeric)
}

/// The title of a read-time line, or `None` for any other line.
///
/// Only a bare trailer (footnote refs, a URL, punctuation) may follow the
/// marker; a marker in the middle of prose does not start an article.
fn title_of(line: &str) -> Option<String> {
    let (start, end) = classifier::find_read_time(line)?;
    if strip_links(&line[end..]).chars().any(char::is_alphanumeric) {
        return None;
    }
    let title = clean_title(&strip_links(&line[..start]));
    (!title.is_empty()).then_some(title)
}

/// `[n] url` entries anywhere in the text.
fn footnote_map<'a>(lines: &[&'a str]) -> HashMap<u32, &'a str> {
    lines
        .iter()
        .filter_map(|&line| {
            let caps = FOOTNOTE_LINE_RE.captures(line)?;
            let n = caps.get(1)?.as_str().parse().ok()?;
            Some((n, caps.get(2)?.as_str()))
        })
        .collect()
}

/// Raw lines following the title that make up its summary.
fn summary_after<'a>(lines: &[&'a str], title_idx: usize) -> Vec<&'a str> {
    let mut taken = Vec::new();
    let mut chars = 0;
    for line in lines.iter().copied().skip(title_idx + 1).take(MAX_SUMMARY_LINES) {
        let trimmed = line.trim();
        if title_of(trimmed).is_some() {
            break;
        }
        if trimmed.is_empty() {
            if taken.is_empty() {
                continue;
            }
            break;
        }
        if is_link_only(trimmed) {
            continue;
        }
        taken.push(trimmed);
        chars += trimmed.chars().count();
        if chars > SUMMARY_CHARS {
            break;
        }
    }
    taken
}

/// First URL near the title that resolves.
///
/// Inline URLs are tried nearest-first (the title line, then below, then
/// above), followed by footnote references on the title and summary lines.
fn find_url<'a>(
    lines: &[&'a str],
    title_idx: usize,
    summary: &[&'a str],
    footnotes: &HashMap<u32, &'a str>,
    ctx: &ExtractContext<'_>,
) -> Option<&'a str> {
    let window = (0..=URL_WINDOW)
        .map(|d| title_idx.checked_add(d))
        .chain((1..=URL_WINDOW).map(|d| title_idx.checked_sub(d)))
        .flatten();
    let inline = window
        .filter_map(|j| lines.get(j).copied())
        .filter(|line| !FOOTNOTE_LINE_RE.is_match(line))
        .flat_map(inline_urls);

    let cited = std::iter::once(lines[title_idx])
        .chain(summary.iter().copied())
        .flat_map(|line| {
            FOOTNOTE_REF_RE
                .captures_iter(line)
                .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        })
        .filter_map(|n| footnotes.get(&n).copied());

    inline
        .chain(cited)
        .find(|href| resolver::resolve(href, &ctx.config.resolver).is_some())
}

/// Every `<title> (N minute read)` line with a resolvable URL nearby.
pub fn read_time_lines(text: &str, ctx: &ExtractContext<'_>) -> Vec<ArticleCandidate> {
    let lines: Vec<&str> = text.lines().collect();
    let footnotes = footnote_map(&lines);

    lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let title = title_of(line)?;
            let summary_lines = summary_after(&lines, i);
            let Some(href) = find_url(&lines, i, &summary_lines, &footnotes, ctx) else {
                debug!(%title, "No resolvable URL near read-time line");
                return None;
            };
            let summary = summary_lines.iter().map(|l| strip_links(l)).join(" ");
            let link = LinkCandidate {
                href: href.to_string(),
                anchor_text: line.trim().to_string(),
                surrounding_text: format!("{} {}", title, summary),
                provenance: Provenance::Text,
            };
            build_candidate(&link, &title, &summary, ctx)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::summary::Summarizer;

    fn extract(text: &str) -> Vec<ArticleCandidate> {
        let config = ExtractionConfig::default();
        let summarizer = Summarizer::new(&config.summary).unwrap();
        let ctx = ExtractContext {
            config: &config,
            summarizer: &summarizer,
        };
        extract_text(text, &ctx)
    }

    const ISSUE: &str = "TLDR 2025-05-06

OpenAI Ships New Model (3 minute read)
https://tracking.tldrnewsletter.com/CL0/https:%2F%2Fopenai.com%2Fblog%2Fnew-model%3Futm_source=tldr/1/0100018f/abc=1
The new model is faster and cheaper than its predecessor. It ships today.

Rust Compiler Gets Faster Builds (5 MINUTE READ) [1]
The compiler team has shipped a new backend that halves build times.

Links:
------
[1] https://blog.rust-lang.org/fast
";

    #[test]
    fn test_read_time_lines_with_inline_and_footnote_urls() {
        let found = extract(ISSUE);
        assert_eq!(found.len(), 2);

        assert_eq!(found[0].title, "OpenAI Ships New Model");
        assert_eq!(found[0].url, "https://openai.com/blog/new-model");
        assert_eq!(found[0].read_time_minutes, Some(3));
        assert_eq!(
            found[0].summary,
            "The new model is faster and cheaper than its predecessor. It ships today."
        );
        assert_eq!(found[0].provenance, Provenance::Text);

        assert_eq!(found[1].title, "Rust Compiler Gets Faster Builds");
        assert_eq!(found[1].url, "https://blog.rust-lang.org/fast");
        assert_eq!(found[1].read_time_minutes, Some(5));
        assert_eq!(
            found[1].summary,
            "The compiler team has shipped a new backend that halves build times."
        );
    }

    #[test]
    fn test_url_above_title_is_found() {
        let text = "https://example.com/before
Database Startup Raises Big Round (2 minute read)
The company plans to hire more engineers this year.";
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://example.com/before");
    }

    #[test]
    fn test_blocked_url_falls_through_to_next() {
        let text = "Quantum Chip Beats Classical Record (4 minute read)
https://tldr.tech/quantum
https://example.com/quantum
Researchers have demonstrated a new milestone.";
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "https://example.com/quantum");
        assert_eq!(found[0].summary, "Researchers have demonstrated a new milestone.");
    }

    #[test]
    fn test_no_url_rejects_candidate() {
        let text = "A Great Article Without Links (4 minute read)
Nothing to click on here, sadly.";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_unknown_footnote_rejects_candidate() {
        let text = "A Great Article With A Dangling Ref (4 minute read) [9]

[1] https://example.com/other";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_short_title_rejected() {
        let text = "AI news (2 minute read)\nhttps://example.com/ai-news";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_sponsored_text_rejected() {
        let text = "Acme Cloud Platform (Sponsor) (2 minute read)
https://acme.com/launch
Deploy faster with Acme. Brought to you by Acme Cloud.";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_marker_inside_prose_is_not_a_title() {
        let text = "This long article (5 minute read) explains a lot of things in detail
https://example.com/prose";
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_read_time_variants_start_candidates() {
        let text = "First Variant Title Here [7 min read]
https://example.com/one

Second Variant Title Here (7-minute read).
https://example.com/two";
        let found = extract(text);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| c.read_time_minutes == Some(7)));
    }

    #[test]
    fn test_summary_stops_at_next_title() {
        let text = "First Headline Goes Right Here (1 minute read)
https://example.com/one
Second Headline Goes Right Here (2 minute read)
https://example.com/two";
        let found = extract(text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].summary, "");
        assert_eq!(found[0].url, "https://example.com/one");
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "Windows Line Endings Article (3 minute read)\r\nhttps://example.com/crlf\r\n";
        let found = extract(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Windows Line Endings Article");
    }

    #[test]
    fn test_empty_text() {
        assert!(extract("").is_empty());
        assert!(extract("\n\n   \n").is_empty());
    }
}
