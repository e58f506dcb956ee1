//! Static configuration and rule tables for the extraction engine.
//!
//! Every keyword list, domain list and threshold the heuristics consult lives
//! here as plain data. [`ExtractionConfig::default`] carries the built-in
//! tables; a YAML file may override any subset of them:
//!
//! ```yaml
//! similarity_threshold: 0.85
//! freshness_hours: 48
//! resolver:
//!   tracking_prefixes:
//!     - "https://tracking.tldrnewsletter.com/CL0/"
//! ```
//!
//! The config is loaded once and passed by reference into
//! [`crate::pipeline::Pipeline::new`]; nothing in the engine reads globals.

use crate::error::Result;
use crate::models::{NewsletterSource, TopicCategory};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// What to do with a link whose destination matches a [`DomainRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainAction {
    /// Rejected by the URL resolver; the link never becomes a candidate.
    Block,
    /// Labelled administrative by the content classifier.
    Admin,
}

/// A case-insensitive substring matched against `host + path`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainRule {
    pub pattern: String,
    pub action: DomainAction,
}

impl DomainRule {
    fn new(pattern: &str, action: DomainAction) -> Self {
        Self {
            pattern: pattern.to_string(),
            action,
        }
    }
}

/// Rules consulted by [`crate::resolver`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverRules {
    /// Host prefixes of click-tracking redirects that embed the destination.
    pub tracking_prefixes: Vec<String>,
    /// Query parameters removed by exact (case-insensitive) name.
    pub tracking_params: Vec<String>,
    /// Query parameters removed by name prefix.
    pub tracking_param_prefixes: Vec<String>,
    pub domain_rules: Vec<DomainRule>,
}

impl Default for ResolverRules {
    fn default() -> Self {
        use DomainAction::{Admin, Block};
        Self {
            tracking_prefixes: strings(&[
                "https://tracking.tldrnewsletter.com/CL0/",
                "http://tracking.tldrnewsletter.com/CL0/",
            ]),
            tracking_params: strings(&[
                "gclid", "fbclid", "mc_cid", "mc_eid", "_hsenc", "_hsmi", "mkt_tok",
                "ck_subscriber_id", "oly_enc_id", "oly_anon_id", "vero_id", "ref_src",
            ]),
            tracking_param_prefixes: strings(&["utm_"]),
            domain_rules: vec![
                // the newsletter's own properties
                DomainRule::new("tldrnewsletter.com", Block),
                DomainRule::new("tldr.tech", Block),
                DomainRule::new("a.tldrnewsletter.com", Block),
                // list management
                DomainRule::new("list-manage.com", Block),
                DomainRule::new("mailchi.mp", Block),
                DomainRule::new("/unsubscribe", Block),
                DomainRule::new("/manage-preferences", Block),
                DomainRule::new("/email-preferences", Block),
                // social profiles
                DomainRule::new("twitter.com", Block),
                DomainRule::new("facebook.com", Block),
                DomainRule::new("instagram.com", Block),
                DomainRule::new("linkedin.com/in/", Block),
                DomainRule::new("linkedin.com/company/", Block),
                DomainRule::new("threads.net", Block),
                // administrative destinations that may still be legitimate hosts
                DomainRule::new("/advertise", Admin),
                DomainRule::new("/sponsor", Admin),
                DomainRule::new("/signup", Admin),
                DomainRule::new("/sign-up", Admin),
                DomainRule::new("/subscribe", Admin),
                DomainRule::new("/referral", Admin),
                DomainRule::new("/feedback", Admin),
                DomainRule::new("forms.gle", Admin),
                DomainRule::new("typeform.com", Admin),
            ],
        }
    }
}

/// Inclusive character bounds on a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TitleBounds {
    pub min_chars: usize,
    pub max_chars: Option<usize>,
}

impl TitleBounds {
    pub fn contains(&self, len: usize) -> bool {
        len >= self.min_chars && self.max_chars.is_none_or(|max| len <= max)
    }
}

/// Rules consulted by [`crate::classifier`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Phrases that mark an anchor text or destination as administrative.
    pub admin_keywords: Vec<String>,
    /// Phrases that mark surrounding text as paid placement.
    pub sponsor_markers: Vec<String>,
    /// Exact (case-insensitive) anchor texts that only navigate.
    pub navigational_phrases: Vec<String>,
    pub html_title: TitleBounds,
    pub text_title: TitleBounds,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            admin_keywords: strings(&[
                "unsubscribe",
                "manage preferences",
                "manage your subscription",
                "update your preferences",
                "email preferences",
                "view in browser",
                "view online",
                "view this email",
                "sign up",
                "signup",
                "subscribe",
                "feedback",
                "advertise",
                "refer a friend",
                "share your referral link",
                "privacy policy",
                "terms of service",
                "apply here",
            ]),
            sponsor_markers: strings(&[
                "sponsor",
                "sponsored",
                "brought to you by",
                "partner content",
                "paid partnership",
                "advertisement",
                "presented by",
            ]),
            navigational_phrases: strings(&[
                "read more",
                "read the full story",
                "continue reading",
                "click here",
                "here",
                "learn more",
                "link",
                "website",
                "home",
                "jobs",
                "careers",
            ]),
            html_title: TitleBounds {
                min_chars: 3,
                max_chars: Some(200),
            },
            text_title: TitleBounds {
                min_chars: 10,
                max_chars: None,
            },
        }
    }
}

/// Rules consulted by [`crate::summary`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SummaryRules {
    /// Regular expressions (case-insensitive) whose matches are deleted.
    pub promo_patterns: Vec<String>,
    /// Tokens whose presence makes a sentence look like a clause.
    pub verb_indicators: Vec<String>,
    pub max_chars: usize,
    pub max_sentences: usize,
    pub min_sentence_chars: usize,
    pub fallback_chars: usize,
}

impl Default for SummaryRules {
    fn default() -> Self {
        Self {
            promo_patterns: strings(&[
                r"(?:also:\s*)?\bsign[\s-]?up\b[^.!?]*[.!?]?",
                r"\bsubscribe\b[^.!?]*[.!?]?",
                r"\b(?:view|read) (?:this email )?(?:in (?:your|the) browser|online)\b[^.!?]*[.!?]?",
                r"\bforward(?:ed)? this (?:email|newsletter)\b[^.!?]*[.!?]?",
                r"\brefer (?:a friend|your friends)\b[^.!?]*[.!?]?",
                r"\bwant to advertise\b[^.!?]*[.!?]?",
                r"\bunsubscribe\b[^.!?]*[.!?]?",
                r"\butm_[a-z]+=\S*",
                r"\b[A-Za-z0-9_-]*[0-9][A-Za-z0-9_-]*[A-Za-z][A-Za-z0-9_-]{20,}\b",
            ]),
            verb_indicators: strings(&[
                "is", "are", "was", "were", "will", "has", "have", "had", "can", "could",
                "would", "should", "may", "might", "must", "does", "do", "did", "be", "been",
                "makes", "supports", "allows", "lets", "helps", "shows", "uses", "adds", "brings", "gives",
                "says", "said", "claims", "plans", "wants", "needs", "aims", "offers",
                "includes", "launches", "releases", "announces", "introduces", "explains",
                "covers", "describes", "discusses", "reveals", "reports", "features",
            ]),
            max_chars: 500,
            max_sentences: 3,
            min_sentence_chars: 20,
            fallback_chars: 300,
        }
    }
}

/// One row of the topic table: a category and the keywords that select it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicRule {
    pub category: TopicCategory,
    pub keywords: Vec<String>,
}

/// One row of the source table: a newsletter edition and its keywords.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceRule {
    pub source: NewsletterSource,
    pub keywords: Vec<String>,
}

/// Heuristic for messages that are not newsletter issues at all.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NonNewsletterRules {
    pub subject_keywords: Vec<String>,
    /// Bodies shorter than this (visible characters) are considered "short".
    pub min_body_chars: usize,
}

impl Default for NonNewsletterRules {
    fn default() -> Self {
        Self {
            subject_keywords: strings(&[
                "confirm",
                "confirmation",
                "welcome",
                "verify",
                "verification",
                "subscription",
                "subscribed",
                "activate",
            ]),
            min_body_chars: 1000,
        }
    }
}

/// Complete configuration surface of the engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub resolver: ResolverRules,
    pub classifier: ClassifierRules,
    pub summary: SummaryRules,
    /// Ordered; the first matching row wins.
    pub topics: Vec<TopicRule>,
    /// Ordered; the first matching row wins, otherwise `tech`.
    pub sources: Vec<SourceRule>,
    pub non_newsletter: NonNewsletterRules,
    /// Titles strictly more similar than this are duplicates.
    pub similarity_threshold: f64,
    /// Messages older than this are skipped.
    pub freshness_hours: i64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverRules::default(),
            classifier: ClassifierRules::default(),
            summary: SummaryRules::default(),
            topics: default_topics(),
            sources: default_sources(),
            non_newsletter: NonNewsletterRules::default(),
            similarity_threshold: 0.8,
            freshness_hours: 24,
        }
    }
}

fn default_topics() -> Vec<TopicRule> {
    let rule = |category, keywords: &[&str]| TopicRule {
        category,
        keywords: strings(keywords),
    };
    vec![
        rule(
            TopicCategory::Ai,
            &[
                "ai", "llm", "llms", "gpt", "openai", "anthropic", "claude", "gemini",
                "machine learning", "neural", "model", "models", "agent", "agents",
                "artificial intelligence", "deepmind", "chatgpt",
            ],
        ),
        rule(
            TopicCategory::BigTech,
            &[
                "apple", "google", "microsoft", "amazon", "meta", "nvidia", "tesla",
                "alphabet", "netflix", "antitrust",
            ],
        ),
        rule(
            TopicCategory::Startups,
            &[
                "startup", "startups", "funding", "raises", "series a", "series b", "seed",
                "vc", "venture", "valuation", "acquires", "acquisition", "ipo", "founder",
            ],
        ),
        rule(
            TopicCategory::Programming,
            &[
                "rust", "python", "javascript", "typescript", "golang", "compiler",
                "programming", "developer", "developers", "api", "framework", "library",
                "open source", "github", "database", "kubernetes",
            ],
        ),
        rule(
            TopicCategory::Science,
            &[
                "science", "scientists", "research", "researchers", "study", "space",
                "nasa", "physics", "biology", "quantum", "climate", "mars",
            ],
        ),
        rule(
            TopicCategory::Security,
            &[
                "security", "vulnerability", "exploit", "breach", "hack", "hackers",
                "malware", "ransomware", "cve", "phishing", "zero-day", "encryption",
            ],
        ),
    ]
}

fn default_sources() -> Vec<SourceRule> {
    let rule = |source, keywords: &[&str]| SourceRule {
        source,
        keywords: strings(keywords),
    };
    vec![
        rule(NewsletterSource::Ai, &["tldr ai", "ai newsletter", "ai"]),
        rule(NewsletterSource::Crypto, &["crypto", "bitcoin", "web3", "defi"]),
        rule(NewsletterSource::Webdev, &["web dev", "webdev", "frontend"]),
        rule(NewsletterSource::Founders, &["founders", "founder"]),
        rule(NewsletterSource::Marketing, &["marketing", "growth"]),
        rule(NewsletterSource::Design, &["design", "designers"]),
        rule(NewsletterSource::Devops, &["devops", "sre", "infrastructure"]),
        rule(NewsletterSource::Security, &["infosec", "security", "cybersecurity"]),
    ]
}

impl ExtractionConfig {
    /// Parse a config from YAML text. Missing keys fall back to the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a config from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&yaml)?;
        info!(
            tracking_prefixes = config.resolver.tracking_prefixes.len(),
            domain_rules = config.resolver.domain_rules.len(),
            topics = config.topics.len(),
            "Loaded extraction config"
        );
        Ok(config)
    }
}
