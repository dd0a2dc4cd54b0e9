//! JSON output generation for the API.
//!
//! This module serializes a [`TrendReport`] to JSON for consumption by
//! external clients.
//!
//! # Output Structure
//!
//! Files are organized by the report's local date:
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     └── report.json
//! ```
//!
//! Later runs on the same day overwrite that day's file.

use crate::models::TrendReport;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the JSON file for `report` under `output_dir`.
pub fn report_path(output_dir: &str, report: &TrendReport) -> PathBuf {
    Path::new(output_dir)
        .join(report.generated_at.date().to_string())
        .join("report.json")
}

/// Write a [`TrendReport`] to `{output_dir}/{date}/report.json`.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_report(
    report: &TrendReport,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(report)?;
    let path = report_path(output_dir, report);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}
