//! Export a merge plan as JSON.
//!
//! Writes the complete plan (not just the preview) so it can be reviewed
//! or diffed before a real run with `--apply`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::models::MergeEntry;
use crate::pipeline::MergeReport;

#[derive(Serialize)]
struct ExportData<'a> {
    generated_at: String,
    language: &'a str,
    total_tags: usize,
    planned_merges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_merges: Option<usize>,
    merges: &'a [MergeEntry],
}

/// Write `report` as pretty JSON to `path`, creating parent directories.
///
/// Never writes to stdout, which belongs to the host under the stdio
/// transport.
pub fn write_plan(report: &MergeReport, language: &str, path: &Path) -> Result<()> {
    let data = ExportData {
        generated_at: chrono::Utc::now().to_rfc3339(),
        language,
        total_tags: report.total_tags,
        planned_merges: report.planned_merges,
        applied_merges: report.applied_merges,
        merges: &report.plan,
    };
    let json = serde_json::to_string_pretty(&data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export directory: {}", parent.display()))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write plan: {}", path.display()))?;
    eprintln!(
        "Exported {} merges to {}",
        report.planned_merges,
        path.display()
    );

    Ok(())
}
