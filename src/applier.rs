//! Executes a merge plan against the host.

use anyhow::{Context, Result};

use crate::host::TagHost;
use crate::models::MergeEntry;
use crate::progress::{scaled_percent, RunEvent, RunReporter, APPLY_PROGRESS_START};

/// Roughly how many progress events a full apply emits.
const PROGRESS_STEPS: usize = 20;

/// Issue `tags.merge` for each plan entry in order, up to `cap` entries.
///
/// A `cap` of `None` applies the whole plan. The first failing call aborts
/// the run; merges already confirmed by the host are not rolled back.
/// Returns the number of merges the host accepted.
pub async fn apply_plan(
    host: &dyn TagHost,
    plan: &[MergeEntry],
    delete_source: bool,
    cap: Option<usize>,
    reporter: &dyn RunReporter,
) -> Result<usize> {
    let todo = cap.map_or(plan.len(), |c| c.min(plan.len()));
    let every = todo.div_ceil(PROGRESS_STEPS).max(1);
    let mut applied = 0usize;

    for entry in &plan[..todo] {
        host.merge_tags(entry.source_id, entry.target_id, delete_source)
            .await
            .with_context(|| {
                format!(
                    "failed to merge tag {} into {} after {} successful merges",
                    entry.source_id, entry.target_id, applied
                )
            })?;
        applied += 1;

        if applied % every == 0 || applied == todo {
            reporter.report(RunEvent::progress(
                scaled_percent(applied as u64, todo as u64, APPLY_PROGRESS_START, 100),
                "merging tags",
            ));
        }
    }

    Ok(applied)
}
