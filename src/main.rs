//! # AI Trend News
//!
//! A daily AI-news digest: pulls a handful of RSS/Atom feeds, picks a small
//! set of fresh, non-duplicate articles, extracts the keywords they mention
//! most, and tags each keyword against the previous run's counts.
//!
//! ## Usage
//!
//! ```sh
//! ai_trend_news -o ./site
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: Download and parse each configured feed (or replay batches from `--entries`)
//! 2. **Selection**: Normalize entries and pick recent articles, newest first
//! 3. **Keywords**: Fold compound phrases, count tokens, keep the top entries
//! 4. **Trends**: Compare with the stored snapshot, then save today's counts
//! 5. **Output**: Write the JSON report and `index.html`

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod feeds;
mod keywords;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod selector;
mod snapshot;
mod trends;
mod utils;

use cli::Cli;
use models::FeedBatch;
use outputs::{html, json};
use pipeline::TrendEngine;
use snapshot::JsonFileStore;
use utils::ensure_writable_dir;

/// Read previously captured feed batches from a JSON file.
fn read_batches(path: &str) -> Result<Vec<FeedBatch>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let batches: Vec<FeedBatch> = serde_json::from_str(&raw)?;
    Ok(batches)
}

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
    info!("ai_trend_news starting up");

    let args = Cli::parse();
    debug!(?args.output_dir, ?args.snapshot, ?args.config, ?args.entries, "Parsed CLI arguments");

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let config = config::load_config(args.config.as_deref().map(Path::new))?;
    let engine = TrendEngine::new(&config)?;

    // ---- Collect feed batches ----
    let batches = match &args.entries {
        Some(path) => {
            let batches = read_batches(path)?;
            info!(path = %path, feeds = batches.len(), "Loaded feed batches from file");
            batches
        }
        None => feeds::collect_feeds(&config).await?,
    };
    let total_entries: usize = batches.iter().map(|b| b.entries.len()).sum();
    info!(feeds = batches.len(), entries = total_entries, "Collected feed entries");

    // ---- Select, extract, classify ----
    let store = JsonFileStore::new(&args.snapshot);
    info!(snapshot = %store.path().display(), "Using keyword snapshot");
    let report = engine.run(&batches, &store, Local::now().naive_local());

    for trend in &report.trends {
        info!(
            keyword = %trend.keyword,
            count = trend.count,
            tag = %trend.tag,
            delta = trend.delta,
            "Trend"
        );
    }

    // ---- Outputs ----
    if let Err(e) = json::write_report(&report, &args.output_dir).await {
        error!(error = %e, "Failed to write JSON report");
    }
    if let Err(e) = html::write_report_html(&report, &args.output_dir).await {
        error!(error = %e, "Failed to write HTML report");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = report.articles.len(),
        keywords = report.keywords.len(),
        "Execution complete"
    );

    Ok(())
}
