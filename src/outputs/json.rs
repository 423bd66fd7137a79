//! JSON output of an ingestion run.
//!
//! Reports are either printed or written to disk, one file per run, grouped
//! by date:
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 071502.json
//!     └── 183011.json
//! ```

use crate::errors::IngestResult;
use crate::models::IngestReport;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

/// Pretty-printed JSON for stdout.
pub fn render_report(report: &IngestReport) -> IngestResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Where `report` is written under `json_output_dir`.
pub fn report_path(report: &IngestReport, json_output_dir: &Path) -> PathBuf {
    json_output_dir
        .join(&report.local_date)
        .join(format!("{}.json", report.local_time.replace(':', "")))
}

/// Write `report` to `{json_output_dir}/{date}/{HHMMSS}.json`.
///
/// Returns the path of the written file.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_report(report: &IngestReport, json_output_dir: &Path) -> IngestResult<PathBuf> {
    let json = serde_json::to_string(report)?;
    let path = report_path(report, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = report.article_count, "Wrote JSON report");
    Ok(path)
}
