//! Core data models used throughout tagmerge.
//!
//! These types represent the tags loaded from the host and the merge
//! entries that flow out of the planner and into the applier.

use serde::{Deserialize, Serialize};

use crate::normalize::is_otherlike;

/// A tag as loaded from the host, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub namespace: String,
    pub name: String,
    pub translation_text: Option<String>,
}

impl Tag {
    /// Whether this tag lives in an uncategorized (`"other"` or empty) namespace.
    pub fn is_otherlike(&self) -> bool {
        is_otherlike(&self.namespace)
    }
}

/// One resolved fold: all data of `source_id` goes into `target_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntry {
    pub source_id: i64,
    pub target_id: i64,
}

/// One page of the host's tag catalog.
///
/// Items are kept as raw JSON so the loader decides what a valid record is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}
