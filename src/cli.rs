//! Command-line interface definitions for AI Trend News.

use clap::Parser;

/// Command-line arguments for the AI Trend News application.
///
/// # Examples
///
/// ```sh
/// # Fetch the configured feeds and write reports to ./site
/// ai_trend_news -o ./site
///
/// # Replay a saved set of feed batches with a custom config
/// ai_trend_news -o ./site -c config.yaml -e batches.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON report and index.html
    #[arg(short, long)]
    pub output_dir: String,

    /// Path of the keyword snapshot used as the trend baseline
    #[arg(short, long, default_value = "keyword_snapshot.json")]
    pub snapshot: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Read feed batches from a JSON file instead of fetching feeds
    #[arg(short, long)]
    pub entries: Option<String>,
}
