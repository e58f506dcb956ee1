//! Merging of duplicate article candidates.
//!
//! The same article routinely shows up several times per message: once per
//! HTML strategy, again in the plaintext part, sometimes with a slightly
//! different headline. [`dedupe`] keeps the first occurrence and drops the
//! rest in two stages:
//!
//! 1. **Exact keys**: a later candidate whose URL or lowercased title was
//!    already kept is dropped.
//! 2. **Near duplicates**: a later candidate whose title is more similar than
//!    the threshold to any kept title is dropped (see [`similarity`]).
//!
//! Input order is preserved, so first-seen always wins, and running the
//! function on its own output changes nothing.

use crate::models::ArticleCandidate;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Title similarity in `[0, 1]`.
///
/// - `1.0` when equal ignoring case
/// - `0.9` when one contains the other (ignoring case)
/// - otherwise the Jaccard overlap of the lowercased word sets
///
/// # Examples
///
/// ```ignore
/// assert_eq!(similarity("OpenAI Ships New Model", "openai ships new model"), 1.0);
/// assert_eq!(similarity("OpenAI Ships New Model", "OpenAI ships new model today"), 0.9);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }
    if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
        return 0.9;
    }

    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Drop exact and near-duplicate candidates, keeping the first of each group.
///
/// Two titles are near duplicates when their [`similarity`] is strictly
/// greater than `threshold`.
#[instrument(level = "debug", skip_all, fields(input = candidates.len(), threshold = threshold))]
pub fn dedupe(candidates: Vec<ArticleCandidate>, threshold: f64) -> Vec<ArticleCandidate> {
    let mut seen_urls = HashSet::new();
    let mut seen_titles = HashSet::new();
    let keyed: Vec<ArticleCandidate> = candidates
        .into_iter()
        .filter(|c| {
            let title = c.title.to_lowercase();
            if seen_urls.contains(&c.url) || seen_titles.contains(&title) {
                debug!(title = %c.title, url = %c.url, "Dropping exact duplicate");
                return false;
            }
            seen_urls.insert(c.url.clone());
            seen_titles.insert(title);
            true
        })
        .collect();

    let mut kept: Vec<ArticleCandidate> = Vec::with_capacity(keyed.len());
    for candidate in keyed {
        if let Some(first) = kept
            .iter()
            .find(|k| similarity(&k.title, &candidate.title) > threshold)
        {
            debug!(
                title = %candidate.title,
                kept = %first.title,
                "Dropping near-duplicate"
            );
            continue;
        }
        kept.push(candidate);
    }
    kept
}
