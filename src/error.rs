//! Crate-wide error type for the fallible edges of the engine.
//!
//! Extraction itself never fails: resolvers, classifiers and extraction passes
//! degrade to "no candidate" instead. Errors only arise while loading
//! configuration, compiling configured patterns, and reading or writing files.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
