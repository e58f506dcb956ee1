//! Turning the text that trails a title into a short, sentence-complete summary.
//!
//! The raw text beside a newsletter link is noisy: promotional asides,
//! tracking tokens, half sentences split by markup. [`Summarizer::normalize`]
//! cleans it up and keeps the first few "complete" sentences.
//!
//! A sentence counts as complete when it starts with an uppercase letter, ends
//! in terminal punctuation, is long enough, and contains something that looks
//! like a verb. Fragments that fail the test are glued onto the nearest
//! preceding complete sentence rather than dropped.

use crate::config::SummaryRules;
use crate::error::{Error, Result};
use crate::utils::{ELLIPSIS, collapse_whitespace, truncate_at_word_boundary};
use regex::Regex;
use std::collections::HashSet;

/// Compiled form of [`SummaryRules`].
#[derive(Debug, Clone)]
pub struct Summarizer {
    promo_patterns: Vec<Regex>,
    verb_indicators: HashSet<String>,
    max_chars: usize,
    max_sentences: usize,
    min_sentence_chars: usize,
    fallback_chars: usize,
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ELLIPSIS)
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’')
}

/// Split on terminal punctuation (plus any closing quotes or brackets)
/// that is followed by whitespace or the end of the text.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if is_terminal(next) || is_closer(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if at_boundary {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

impl Summarizer {
    /// Compile the configured promotional patterns.
    ///
    /// Patterns are matched case-insensitively.
    pub fn new(rules: &SummaryRules) -> Result<Self> {
        let promo_patterns = rules
            .promo_patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){}", pattern)).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            promo_patterns,
            verb_indicators: rules
                .verb_indicators
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
            max_chars: rules.max_chars,
            max_sentences: rules.max_sentences,
            min_sentence_chars: rules.min_sentence_chars,
            fallback_chars: rules.fallback_chars,
        })
    }

    /// Collapse whitespace, delete promotional phrases and trim stray
    /// punctuation left at either end.
    pub fn clean(&self, raw: &str) -> String {
        let mut text = collapse_whitespace(raw);
        for pattern in &self.promo_patterns {
            text = pattern.replace_all(&text, " ").into_owned();
        }
        let text = collapse_whitespace(&text);
        let leading = |c: char| {
            c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '-' | '|' | ')' | ']')
        };
        let trailing = |c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-' | '|');
        text.trim_start_matches(leading)
            .trim_end_matches(trailing)
            .to_string()
    }

    fn has_verb(&self, sentence: &str) -> bool {
        sentence
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .map(|w| w.to_lowercase())
            .any(|w| {
                self.verb_indicators.contains(&w)
                    || (w.chars().count() > 4 && (w.ends_with("ing") || w.ends_with("ed")))
            })
    }

    /// The completeness test described in the module docs.
    pub fn is_complete(&self, sentence: &str) -> bool {
        let starts_upper = sentence.chars().next().is_some_and(char::is_uppercase);
        let ends_terminal = sentence
            .trim_end_matches(is_closer)
            .chars()
            .last()
            .is_some_and(is_terminal);
        starts_upper
            && ends_terminal
            && sentence.chars().count() >= self.min_sentence_chars
            && self.has_verb(sentence)
    }

    /// Group sentences so that each group starts at a complete sentence and
    /// carries the fragments that follow it. Fragments before the first
    /// complete sentence are carried into that first group.
    fn group_sentences(&self, sentences: &[&str]) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        let mut leading: Vec<&str> = Vec::new();

        for sentence in sentences {
            if self.is_complete(sentence) {
                let mut group = leading.drain(..).collect::<Vec<_>>().join(" ");
                if !group.is_empty() {
                    group.push(' ');
                }
                group.push_str(sentence);
                groups.push(group);
            } else if let Some(last) = groups.last_mut() {
                last.push(' ');
                last.push_str(sentence);
            } else {
                leading.push(sentence);
            }
        }
        groups
    }

    /// Normalize raw trailing text into a bounded summary.
    ///
    /// The result never exceeds the configured `max_chars` characters and ends
    /// with `…` whenever it was shortened.
    pub fn normalize(&self, raw: &str) -> String {
        let text = self.clean(raw);
        if text.is_empty() {
            return String::new();
        }

        let sentences = split_sentences(&text);
        let groups = self.group_sentences(&sentences);
        let summary = if groups.is_empty() {
            truncate_at_word_boundary(&text, self.fallback_chars)
        } else {
            groups
                .into_iter()
                .take(self.max_sentences)
                .collect::<Vec<_>>()
                .join(" ")
        };
        truncate_at_word_boundary(&summary, self.max_chars)
    }
}
