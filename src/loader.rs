//! Paged tag loading.
//!
//! Pulls the whole catalog from the host one page at a time, normalizes
//! each record, and feeds the candidate index as pages arrive. The tag list
//! is retained in catalog order for the planner.

use anyhow::{Context, Result};

use crate::host::TagHost;
use crate::index::TagIndex;
use crate::models::Tag;
use crate::normalize::tag_from_value;
use crate::progress::{scaled_percent, RunEvent, RunReporter, LOAD_PROGRESS_CAP};

/// Tags loaded from the host plus bookkeeping about dropped records.
#[derive(Debug, Default)]
pub struct LoadedTags {
    pub tags: Vec<Tag>,
    /// Records dropped because their id was missing, non-numeric, or ≤ 0.
    pub skipped: usize,
}

/// Load every tag from `host`, inserting each one into `index`.
///
/// Requests offsets `0, page_size, 2 * page_size, ...` until the total
/// reported by the first page is reached. An empty page before that point
/// also ends the loop. Any host error aborts loading; nothing is retried.
pub async fn load_tags(
    host: &dyn TagHost,
    language: &str,
    page_size: u64,
    index: &mut TagIndex,
    reporter: &dyn RunReporter,
) -> Result<LoadedTags> {
    let page_size = page_size.max(1);
    let mut loaded = LoadedTags::default();
    let mut offset = 0u64;
    let mut total: Option<u64> = None;

    loop {
        let page = host
            .list_tags(language, page_size, offset)
            .await
            .with_context(|| format!("failed to load tags at offset {}", offset))?;
        let total = *total.get_or_insert(page.total);
        let received = page.items.len();

        for item in &page.items {
            match tag_from_value(item) {
                Some(tag) => {
                    index.insert(&tag);
                    loaded.tags.push(tag);
                }
                None => loaded.skipped += 1,
            }
        }

        offset += page_size;
        reporter.report(RunEvent::progress(
            scaled_percent(offset, total, 0, LOAD_PROGRESS_CAP),
            "loading tags",
        ));

        if offset >= total || received == 0 {
            break;
        }
    }

    if loaded.skipped > 0 {
        reporter.report(RunEvent::Skipped {
            count: loaded.skipped,
        });
    }

    Ok(loaded)
}
