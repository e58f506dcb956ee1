//! Command-line interface definitions for Newsletter Digest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can be provided via command-line flags or environment variables.

use clap::Parser;

/// Command-line arguments for the Newsletter Digest binary.
///
/// # Examples
///
/// ```sh
/// # Process every message file in a directory
/// newsletter_digest -i ./inbox -j ./json
///
/// # With a rule override file and a Markdown reading list
/// newsletter_digest -i ./inbox -j ./json -m ./markdown -c rules.yaml
///
/// # Re-run yesterday's mail
/// newsletter_digest -i ./inbox -j ./json --max-age-hours 48
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Message JSON files, or directories of them
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Output directory for the JSON digest
    #[arg(short, long, env = "DIGEST_JSON_DIR")]
    pub json_output_dir: String,

    /// Output directory for the Markdown reading list
    #[arg(short, long, env = "DIGEST_MARKDOWN_DIR")]
    pub markdown_output_dir: Option<String>,

    /// Optional path to a YAML rules file
    #[arg(short, long, env = "DIGEST_CONFIG")]
    pub config: Option<String>,

    /// Override the freshness window (hours)
    #[arg(long, env = "DIGEST_MAX_AGE_HOURS")]
    pub max_age_hours: Option<i64>,

    /// How many message files to process at once
    #[arg(long, default_value_t = 12)]
    pub parallelism: usize,
}
