//! # Newsletter Digest
//!
//! Extracts clean, deduplicated article references from newsletter emails.
//!
//! Newsletter issues bury every article behind click-tracking redirects,
//! sponsor blocks, footer boilerplate and table-based layouts. This crate
//! turns one raw message (subject, sender, timestamp, HTML and plaintext
//! bodies) into an ordered list of [`Article`]s: title, canonical URL,
//! short summary, read time, topic and newsletter source.
//!
//! ## Architecture
//!
//! The engine is a synchronous, stateless pipeline:
//! 1. **Resolve**: decode tracking redirects and canonicalize URLs ([`resolver`])
//! 2. **Classify**: reject administrative, sponsored and navigational links ([`classifier`])
//! 3. **Extract**: walk the HTML and plaintext bodies ([`extractors`])
//! 4. **Summarize**: normalize trailing text into a bounded summary ([`summary`])
//! 5. **Deduplicate**: merge exact and near-duplicate candidates ([`dedupe`])
//!
//! [`pipeline::Pipeline`] sequences these per message. The binary wraps it in a
//! concurrent batch runner over message files and writes JSON and Markdown
//! digests ([`outputs`]).

pub mod classifier;
pub mod config;
pub mod dedupe;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod models;
pub mod outputs;
pub mod pipeline;
pub mod resolver;
pub mod summary;
pub mod utils;

pub use config::ExtractionConfig;
pub use error::{Error, Result};
pub use models::{Article, ArticleCandidate, Digest, NewsletterSource, RawMessage};
pub use pipeline::Pipeline;
