//! Merge planning.
//!
//! Turns the loaded catalog and its [`TagIndex`] into an ordered list of
//! [`MergeEntry`] values:
//!
//! 1. **Propose** at most one edge per tag:
//!    - categorized tag: its normalized name matches a translation claimed by
//!      exactly one other tag in the same namespace;
//!    - otherlike tag: its normalized name matches exactly one categorized
//!      candidate across all namespaces.
//! 2. **Resolve** each target through the edge map so chains collapse to
//!    their final destination. Cycles stop at the last node before a revisit.
//! 3. **Filter** self-merges and otherlike → otherlike merges.
//! 4. **Order** by ascending source id.
//!
//! Planning never fails: anything that cannot be looked up simply produces
//! no edge.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::index::{TagIndex, TranslationSlot};
use crate::models::{MergeEntry, Tag};
use crate::normalize::{is_otherlike, normalize_key};

/// Proposed `source → target` edges, keyed (and therefore sorted) by source.
pub type MergeEdges = BTreeMap<i64, i64>;

/// Propose raw edges in catalog order. The first edge for a source wins.
pub fn propose_edges(tags: &[Tag], index: &TagIndex) -> MergeEdges {
    let mut edges = MergeEdges::new();

    for tag in tags {
        if edges.contains_key(&tag.id) {
            continue;
        }
        let key = normalize_key(&tag.name);

        let target = if tag.is_otherlike() {
            index
                .candidates(&key)
                .filter(|ids| ids.len() == 1)
                .and_then(|ids| ids.iter().next().copied())
        } else {
            match index.translation(&tag.namespace, &key) {
                Some(TranslationSlot::Resolved(id)) => Some(id),
                Some(TranslationSlot::Ambiguous) | None => None,
            }
        };

        if let Some(target) = target.filter(|&t| t != tag.id) {
            edges.insert(tag.id, target);
        }
    }

    edges
}

/// Follow `edges` from `start` to the final destination.
///
/// On a revisit, the last id reached before the repeat is returned, so a
/// cycle ends the walk instead of looping.
pub fn resolve_target(edges: &MergeEdges, start: i64) -> i64 {
    let mut visited = HashSet::new();
    let mut current = start;
    visited.insert(current);

    while let Some(&next) = edges.get(&current) {
        if !visited.insert(next) {
            break;
        }
        current = next;
    }

    current
}

/// Build the final merge plan, sorted ascending by source id.
pub fn build_plan(tags: &[Tag], index: &TagIndex) -> Vec<MergeEntry> {
    let edges = propose_edges(tags, index);
    plan_from_edges(tags, &edges)
}

/// Resolve and filter a set of edges into a plan.
pub fn plan_from_edges(tags: &[Tag], edges: &MergeEdges) -> Vec<MergeEntry> {
    let namespaces: HashMap<i64, &str> = tags
        .iter()
        .map(|t| (t.id, t.namespace.as_str()))
        .rev()
        .collect();

    edges
        .iter()
        .filter_map(|(&source_id, &proposed)| {
            let target_id = resolve_target(edges, proposed);
            if target_id == source_id {
                return None;
            }
            let source_ns = namespaces.get(&source_id)?;
            let target_ns = namespaces.get(&target_id)?;
            if is_otherlike(source_ns) && is_otherlike(target_ns) {
                return None;
            }
            Some(MergeEntry {
                source_id,
                target_id,
            })
        })
        .collect()
}
