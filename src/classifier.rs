//! Heuristic labelling of link text and the blocks around it.
//!
//! [`classify`] decides whether a (title, destination, surrounding text)
//! triple is an article worth keeping. It never fails; every input gets one of
//! the [`Classification`] labels.
//!
//! # Precedence
//!
//! 1. Administrative anchor text or destination wins over everything.
//! 2. Sponsor markers in the surrounding text reject the block **unless** the
//!    same text also carries a read-time marker such as `(3 minute read)`.
//!    Paid placements that publish a read time are therefore accepted; this is
//!    the established behaviour and is kept as-is.
//! 3. Bare navigation text and titles outside the pass's bounds are
//!    navigational.
//!
//! The module also hosts the other keyword lookups that share the same
//! tables: read-time parsing, topic tagging and newsletter source detection.

use crate::config::{ClassifierRules, DomainAction, ExtractionConfig, SourceRule, TopicRule};
use crate::models::{NewsletterSource, Provenance, TopicCategory};
use crate::resolver::find_domain_rule;
use crate::utils::{haystack_contains, haystack_contains_prefix, keyword_haystack};
use once_cell::sync::Lazy;
use regex::Regex;

/// `(4 minute read)`, `[4 min read]`, `(4-minute read)`, `(4 Minutes Read)`.
static READ_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\(\[]\s*(\d{1,3})[\s-]*min(?:ute)?s?\.?\s+read\s*[\)\]]")
        .expect("READ_TIME_RE should compile")
});

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Accept,
    RejectAdmin,
    RejectNavigational,
    RejectSponsored,
}

impl Classification {
    pub fn is_accept(self) -> bool {
        self == Classification::Accept
    }
}

/// Minutes from the first read-time marker in `text`.
pub fn read_time_minutes(text: &str) -> Option<u32> {
    READ_TIME_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn has_read_time(text: &str) -> bool {
    READ_TIME_RE.is_match(text)
}

/// Delete every read-time marker from `text`.
pub fn strip_read_time(text: &str) -> String {
    READ_TIME_RE.replace_all(text, " ").into_owned()
}

/// Byte range of the first read-time marker, for callers that split around it.
pub fn find_read_time(text: &str) -> Option<(usize, usize)> {
    READ_TIME_RE.find(text).map(|m| (m.start(), m.end()))
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack_contains(haystack, n))
}

/// Anchor text or destination that points at list administration.
pub fn is_admin(title: &str, href: &str, config: &ExtractionConfig) -> bool {
    let rules = &config.classifier;
    if contains_any(&keyword_haystack(title), &rules.admin_keywords) {
        return true;
    }
    let lowered = href.to_lowercase();
    if rules
        .admin_keywords
        .iter()
        .any(|kw| lowered.contains(kw.trim().replace(' ', "-").as_str()))
    {
        return true;
    }
    find_domain_rule(href, &config.resolver.domain_rules, DomainAction::Admin).is_some()
}

/// Sponsor language without the read-time counter-signal.
///
/// Markers match inflected forms too: `sponsor` flags "sponsors" and
/// "sponsorship".
pub fn is_sponsored(surrounding: &str, rules: &ClassifierRules) -> bool {
    let haystack = keyword_haystack(surrounding);
    rules
        .sponsor_markers
        .iter()
        .any(|marker| haystack_contains_prefix(&haystack, marker))
        && !has_read_time(surrounding)
}

/// Text that only navigates ("read more", "here").
pub fn is_navigational_text(title: &str, rules: &ClassifierRules) -> bool {
    let normalized = keyword_haystack(title);
    let normalized = normalized.trim();
    normalized.is_empty()
        || rules
            .navigational_phrases
            .iter()
            .any(|p| keyword_haystack(p).trim() == normalized)
}

/// Label a candidate title, destination and its surrounding block text.
pub fn classify(
    title: &str,
    href: &str,
    surrounding: &str,
    provenance: Provenance,
    config: &ExtractionConfig,
) -> Classification {
    let rules = &config.classifier;
    if is_admin(title, href, config) {
        return Classification::RejectAdmin;
    }
    if is_sponsored(surrounding, rules) {
        return Classification::RejectSponsored;
    }
    let bounds = match provenance {
        Provenance::Html => rules.html_title,
        Provenance::Text => rules.text_title,
    };
    if is_navigational_text(title, rules) || !bounds.contains(title.trim().chars().count()) {
        return Classification::RejectNavigational;
    }
    Classification::Accept
}

/// First topic whose keywords occur (as whole words) in `text`.
pub fn detect_topic(text: &str, topics: &[TopicRule]) -> Option<TopicCategory> {
    let haystack = keyword_haystack(text);
    topics
        .iter()
        .find(|rule| contains_any(&haystack, &rule.keywords))
        .map(|rule| rule.category)
}

/// Newsletter edition named by the sender and subject, `tech` by default.
pub fn classify_source(sender: &str, subject: &str, sources: &[SourceRule]) -> NewsletterSource {
    let haystack = keyword_haystack(&format!("{} {}", sender, subject));
    sources
        .iter()
        .find(|rule| contains_any(&haystack, &rule.keywords))
        .map(|rule| rule.source)
        .unwrap_or_default()
}
