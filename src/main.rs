//! # Newsletter Digest
//!
//! Batch runner for the newsletter extraction engine. Reads raw message JSON
//! files, extracts the articles from every message, removes repeats across
//! messages, and writes a JSON digest plus an optional Markdown reading list.
//!
//! ## Usage
//!
//! ```sh
//! newsletter_digest -i ./inbox -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! 1. **Loading**: Expand the inputs into message files and load the rules
//! 2. **Processing**: Run the pipeline on each message (parallel, 12 at a time by default)
//! 3. **Merging**: Keep the first article per URL, in input file order
//! 4. **Output**: Write the JSON digest and the Markdown reading list

use chrono::Local;
use clap::Parser;
use futures::stream::{self, StreamExt};
use newsletter_digest::models::{Article, Digest};
use newsletter_digest::outputs::{json, markdown};
use newsletter_digest::pipeline::merge_across_messages;
use newsletter_digest::utils::{collect_message_files, ensure_writable_dir, read_message, time_of_day};
use newsletter_digest::{ExtractionConfig, Pipeline};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("newsletter_digest starting up");

    let args = Cli::parse();
    debug!(?args.inputs, ?args.json_output_dir, ?args.markdown_output_dir, "Parsed CLI arguments");

    // Early check: ensure JSON output dir is writable
    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir,
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Load rules ----
    let mut config = match &args.config {
        Some(path) => ExtractionConfig::load(path)?,
        None => {
            info!("No rules file given; using built-in tables");
            ExtractionConfig::default()
        }
    };
    if let Some(hours) = args.max_age_hours {
        info!(hours, "Overriding freshness window");
        config.freshness_hours = hours;
    }
    let pipeline = Arc::new(Pipeline::new(config)?);

    let paths = collect_message_files(&args.inputs).await?;
    let total_messages = paths.len();
    info!(count = total_messages, parallelism = args.parallelism, "Starting message processing");

    // ---- Process messages concurrently ----
    let mut results: Vec<(usize, Vec<Article>)> = stream::iter(paths.into_iter().enumerate())
        .map(|(i, path)| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let message = match read_message(&path).await {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable message file");
                        return None;
                    }
                };
                // Extraction is CPU-bound; keep it off the async workers
                match tokio::task::spawn_blocking(move || pipeline.process(&message)).await {
                    Ok(articles) => {
                        debug!(index = i, count = articles.len(), "Processed message");
                        Some((i, articles))
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Extraction task failed; skipping message");
                        None
                    }
                }
            }
        })
        .buffer_unordered(args.parallelism.max(1))
        .filter_map(|result| async move { result })
        .collect()
        .await;

    // First-seen must follow input order, not completion order
    results.sort_by_key(|(i, _)| *i);
    let messages_seen = results.len();
    let articles = merge_across_messages(results.into_iter().flat_map(|(_, articles)| articles));
    info!(
        total = total_messages,
        processed = messages_seen,
        failed = total_messages - messages_seen,
        articles = articles.len(),
        "Completed message processing"
    );

    let digest = Digest {
        local_date: Local::now().date_naive().to_string(),
        time_of_day: time_of_day(),
        messages_seen,
        articles,
    };

    // ---- Outputs ----
    if let Err(e) = json::write_digest(&digest, &args.json_output_dir).await {
        error!(error = %e, "Failed to write JSON digest");
    }

    if let Some(markdown_output_dir) = &args.markdown_output_dir {
        if let Err(e) = markdown::write_markdown(&digest, markdown_output_dir).await {
            error!(path = %markdown_output_dir, error = %e, "Failed writing Markdown");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        edition = %digest.time_of_day,
        date = %digest.local_date,
        "Execution complete"
    );

    Ok(())
}
