//! Merge run orchestration.
//!
//! Coordinates the full run: load (indexing as pages arrive) → plan →
//! preview → apply. Dry runs stop after the preview and never call
//! `tags.merge`.

use anyhow::Result;
use serde::Serialize;

use crate::applier::apply_plan;
use crate::config::Config;
use crate::host::TagHost;
use crate::index::TagIndex;
use crate::loader::load_tags;
use crate::models::MergeEntry;
use crate::planner::build_plan;
use crate::progress::{RunEvent, RunReporter, PLAN_PROGRESS};

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub total_tags: usize,
    pub skipped_records: usize,
    pub planned_merges: usize,
    /// `None` on a dry run.
    pub applied_merges: Option<usize>,
    pub plan: Vec<MergeEntry>,
}

/// Final structured result handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Success {
        success: bool,
        total_tags: usize,
        planned_merges: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        applied_merges: Option<usize>,
    },
    Failure {
        success: bool,
        message: String,
    },
}

impl RunOutcome {
    pub fn from_result(result: &Result<MergeReport>) -> Self {
        match result {
            Ok(report) => RunOutcome::Success {
                success: true,
                total_tags: report.total_tags,
                planned_merges: report.planned_merges,
                applied_merges: report.applied_merges,
            },
            Err(e) => RunOutcome::Failure {
                success: false,
                message: format!("{:#}", e),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

/// Run one full merge pass against `host`.
///
/// Uses `config.merge` for language, paging, dry-run, source deletion and
/// the merge cap, and `config.output.preview_limit` for the plan preview.
pub async fn run_merge(
    config: &Config,
    host: &dyn TagHost,
    reporter: &dyn RunReporter,
) -> Result<MergeReport> {
    let merge = &config.merge;
    let mut index = TagIndex::new();

    let loaded = load_tags(
        host,
        &merge.language,
        merge.effective_page_size(),
        &mut index,
        reporter,
    )
    .await?;

    let plan = build_plan(&loaded.tags, &index);
    reporter.report(RunEvent::progress(PLAN_PROGRESS, "planning merges"));
    reporter.report(RunEvent::PlanPreview {
        total: plan.len(),
        entries: plan
            .iter()
            .take(config.output.preview_limit)
            .copied()
            .collect(),
    });

    let applied_merges = if merge.dry_run {
        None
    } else {
        Some(apply_plan(host, &plan, merge.delete_source, merge.merge_cap(), reporter).await?)
    };

    reporter.report(RunEvent::progress(100, "done"));

    Ok(MergeReport {
        total_tags: loaded.tags.len(),
        skipped_records: loaded.skipped,
        planned_merges: plan.len(),
        applied_merges,
        plan,
    })
}
