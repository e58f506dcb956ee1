//! Tracking-link decoding and URL canonicalization.
//!
//! Newsletter links rarely point straight at the article. Most go through a
//! click-tracking redirect that carries the destination percent-encoded inside
//! its path, e.g.
//!
//! ```text
//! https://tracking.tldrnewsletter.com/CL0/https:%2F%2Fexample.com%2Fpost%3Futm_source=tldr/1/0100018f-abc/xyz=
//! ```
//!
//! [`resolve`] turns such a link (or an ordinary absolute link) into the
//! canonical destination: tracking parameters removed, one trailing slash
//! dropped, and blocklisted destinations rejected. It is a pure function of
//! its input and the [`ResolverRules`]; every failure collapses to `None`.

use crate::config::{DomainAction, DomainRule, ResolverRules};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use url::Url;
use url::form_urlencoded;

/// First well-formed absolute http(s) URL inside arbitrary text.
static EMBEDDED_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)https?://[^\s"'<>]+"#).expect("EMBEDDED_URL_RE should compile"));

/// The redirect service appends `/<version>/<message-id>/<signature>` after the
/// destination. Anchored at the end so a raw destination's own path survives.
static TRACKING_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/\d+/[0-9A-Za-z-]+(?:/[^/]*)?$").expect("TRACKING_SUFFIX_RE should compile")
});

/// If `href` is a click-tracking redirect, return the encoded segment after
/// the tracking prefix (with the redirect's own trailing path removed).
pub fn tracking_segment<'a>(href: &'a str, rules: &ResolverRules) -> Option<&'a str> {
    let href = href.trim();
    rules.tracking_prefixes.iter().find_map(|prefix| {
        let head = href.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = &href[prefix.len()..];
        let segment = match TRACKING_SUFFIX_RE.find(rest) {
            Some(m) if m.start() > 0 => &rest[..m.start()],
            _ => rest,
        };
        (!segment.is_empty()).then_some(segment)
    })
}

/// True when `href` has the click-tracking redirect shape.
pub fn is_tracking_link(href: &str, rules: &ResolverRules) -> bool {
    tracking_segment(href, rules).is_some()
}

/// Decode the destination carried by a tracking segment.
///
/// Two percent-decoding passes are applied because senders double-encode.
/// If either pass fails (broken escapes, invalid UTF-8), the first http(s)
/// substring of the raw segment is used instead.
fn decode_tracking_segment(segment: &str) -> Option<String> {
    let decoded = urlencoding::decode(segment)
        .ok()
        .and_then(|once| urlencoding::decode(&once).ok().map(|twice| twice.into_owned()));

    let haystack = match decoded {
        Some(ref text) => text.as_str(),
        None => {
            debug!(segment, "Tracking segment failed to decode; scanning raw text");
            segment
        }
    };
    EMBEDDED_URL_RE
        .find(haystack)
        .map(|m| m.as_str().to_string())
}

fn is_tracking_param(name: &str, rules: &ResolverRules) -> bool {
    let name = name.to_ascii_lowercase();
    rules
        .tracking_params
        .iter()
        .any(|p| p.eq_ignore_ascii_case(&name))
        || rules
            .tracking_param_prefixes
            .iter()
            .any(|p| name.starts_with(&p.to_ascii_lowercase()))
}

/// Decoded name of one raw `name=value` query segment.
fn param_name(segment: &str) -> String {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}

/// Remove tracking query parameters and the fragment, then drop one
/// trailing slash from the serialized URL.
///
/// Kept parameters are copied byte for byte; a query with nothing to remove
/// is left untouched.
fn canonicalize(mut url: Url, rules: &ResolverRules) -> String {
    url.set_fragment(None);
    if let Some(query) = url.query() {
        let segments: Vec<&str> = query.split('&').collect();
        let kept: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|seg| !seg.is_empty() && !is_tracking_param(&param_name(seg), rules))
            .collect();
        if kept.len() != segments.len() {
            let query = kept.join("&");
            url.set_query((!query.is_empty()).then_some(query.as_str()));
        }
    }
    let mut out: String = url.into();
    if out.ends_with('/') {
        out.pop();
    }
    out
}

/// The first rule with `action` whose pattern occurs in `host + path` of `url`.
pub fn find_domain_rule<'r>(
    url: &str,
    rules: &'r [DomainRule],
    action: DomainAction,
) -> Option<&'r DomainRule> {
    let parsed = Url::parse(url).ok()?;
    let location = format!(
        "{}{}",
        parsed.host_str().unwrap_or_default(),
        parsed.path()
    )
    .to_lowercase();
    rules
        .iter()
        .filter(|rule| rule.action == action)
        .find(|rule| location.contains(&rule.pattern.to_lowercase()))
}

/// Resolve a raw link target into a canonical article URL.
///
/// Returns `None` when the link is not an absolute http(s) URL, when a
/// tracking redirect cannot be decoded, or when the destination is blocked.
pub fn resolve(href: &str, rules: &ResolverRules) -> Option<String> {
    let href = href.trim();
    let destination = match tracking_segment(href, rules) {
        Some(segment) => decode_tracking_segment(segment)?,
        None => href.to_string(),
    };

    let url = Url::parse(&destination).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    let canonical = canonicalize(url, rules);
    if let Some(rule) = find_domain_rule(&canonical, &rules.domain_rules, DomainAction::Block) {
        debug!(url = %canonical, pattern = %rule.pattern, "Destination is blocklisted");
        return None;
    }
    Some(canonical)
}
