//! JSON report output.
//!
//! Weekly runs are filed by date:
//! ```text
//! json_output_dir/
//! └── 2025-08-16/
//!     └── report.json
//! ```
//! A second run on the same date replaces that day's report.

use crate::models::WeeklyRun;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`WeeklyRun`] to a JSON file with date-based directory structure.
///
/// # Arguments
///
/// * `run` - The finished weekly run to serialize
/// * `json_output_dir` - Base directory for JSON output
///
/// # Returns
///
/// The path of the written file, or an error if serialization, directory
/// creation or file writing fails.
///
/// # Output Path
///
/// The file is written to: `{json_output_dir}/{date}/report.json`
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display(), date = %run.date))]
pub async fn write_weekly_run(run: &WeeklyRun, json_output_dir: &Path) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(run)?;

    let full_json_dir = json_output_dir.join(&run.date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join("report.json");
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename.display(), "Wrote JSON report");

    Ok(output_json_filename)
}
