//! The host collaborator: the media-archive process that owns the tags.
//!
//! tagmerge never touches tag storage directly. Everything goes through two
//! logical operations on a [`TagHost`]:
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | `tags.list(language, limit, offset)` | One page of the catalog |
//! | `tags.merge(source, target, delete_source)` | Fold one tag into another |
//!
//! Transports live in [`crate::host_http`] (JSON over HTTP) and
//! [`crate::host_stdio`] (line-delimited JSON-RPC on stdin/stdout).
//! [`MemoryHost`] keeps a catalog in memory for tests and embedding.
//!
//! Implementations must not retry. A failed call is returned as an error
//! and ends the run.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use crate::config::{Config, HostTransport};
use crate::models::TagPage;
use crate::normalize::coerce_id;

/// Access to the host's tag catalog.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use async_trait::async_trait;
/// use tagmerge::host::TagHost;
/// use tagmerge::models::TagPage;
///
/// pub struct EmptyHost;
///
/// #[async_trait]
/// impl TagHost for EmptyHost {
///     fn name(&self) -> &str { "empty" }
///
///     async fn list_tags(&self, _language: &str, limit: u64, offset: u64) -> Result<TagPage> {
///         Ok(TagPage { total: 0, limit, offset, items: vec![] })
///     }
///
///     async fn merge_tags(&self, _source: i64, _target: i64, _delete: bool) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TagHost: Send + Sync {
    /// Short transport label used in messages (e.g. `"http"`, `"stdio"`).
    fn name(&self) -> &str;

    /// Fetch one page of tags with translations in `language`.
    ///
    /// Called repeatedly with increasing offsets until `offset >= total`.
    async fn list_tags(&self, language: &str, limit: u64, offset: u64) -> Result<TagPage>;

    /// Fold `source_id` into `target_id`, optionally deleting the source.
    async fn merge_tags(&self, source_id: i64, target_id: i64, delete_source: bool) -> Result<()>;
}

/// Build the host binding selected by `[host].transport`.
pub fn create_host(config: &Config) -> Result<Box<dyn TagHost>> {
    match config.host.transport {
        HostTransport::Http => Ok(Box::new(crate::host_http::HttpHost::new(&config.host)?)),
        HostTransport::Stdio => Ok(Box::new(crate::host_stdio::StdioHost::from_process())),
    }
}

// ═══════════════════════════════════════════════════════════════════════
// In-memory host
// ═══════════════════════════════════════════════════════════════════════

/// A recorded `tags.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub language: String,
    pub limit: u64,
    pub offset: u64,
}

/// A recorded `tags.merge` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeCall {
    pub source_id: i64,
    pub target_id: i64,
    pub delete_source: bool,
}

/// In-memory host for testing and embedding.
///
/// Records are stored as raw JSON so malformed entries can be served the
/// same way a real host would serve them.
pub struct MemoryHost {
    records: Mutex<Vec<Value>>,
    list_calls: Mutex<Vec<ListCall>>,
    merge_calls: Mutex<Vec<MergeCall>>,
    fail_list_at: Option<u64>,
    fail_merge_on: Option<i64>,
}

impl MemoryHost {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records: Mutex::new(records),
            list_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            fail_list_at: None,
            fail_merge_on: None,
        }
    }

    /// Make `tags.list` fail for the page starting at `offset`.
    pub fn fail_list_at(mut self, offset: u64) -> Self {
        self.fail_list_at = Some(offset);
        self
    }

    /// Make `tags.merge` fail when `source_id` is merged.
    pub fn fail_merge_on(mut self, source_id: i64) -> Self {
        self.fail_merge_on = Some(source_id);
        self
    }

    pub fn list_calls(&self) -> Vec<ListCall> {
        self.list_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Ids currently present in the catalog.
    pub fn ids(&self) -> Vec<i64> {
        self.records
            .lock()
            .map(|r| r.iter().filter_map(|v| v.get("id").and_then(coerce_id)).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TagHost for MemoryHost {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_tags(&self, language: &str, limit: u64, offset: u64) -> Result<TagPage> {
        self.list_calls
            .lock()
            .map_err(|_| anyhow::anyhow!("memory host lock poisoned"))?
            .push(ListCall {
                language: language.to_string(),
                limit,
                offset,
            });

        if self.fail_list_at == Some(offset) {
            bail!("tags.list failed at offset {}", offset);
        }

        let records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory host lock poisoned"))?;
        let items = records
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(TagPage {
            total: records.len() as u64,
            limit,
            offset,
            items,
        })
    }

    async fn merge_tags(&self, source_id: i64, target_id: i64, delete_source: bool) -> Result<()> {
        if self.fail_merge_on == Some(source_id) {
            bail!("tags.merge rejected {} -> {}", source_id, target_id);
        }

        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory host lock poisoned"))?;
        let exists = |id: i64| {
            records
                .iter()
                .any(|v| v.get("id").and_then(coerce_id) == Some(id))
        };
        if !exists(source_id) {
            bail!("source tag {} not found", source_id);
        }
        if !exists(target_id) {
            bail!("target tag {} not found", target_id);
        }
        if delete_source {
            records.retain(|v| v.get("id").and_then(coerce_id) != Some(source_id));
        }
        drop(records);

        self.merge_calls
            .lock()
            .map_err(|_| anyhow::anyhow!("memory host lock poisoned"))?
            .push(MergeCall {
                source_id,
                target_id,
                delete_source,
            });
        Ok(())
    }
}
