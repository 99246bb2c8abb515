//! TOML configuration.
//!
//! Every key has a default, so an empty file (or [`Config::minimal`]) is a
//! valid configuration: dry run, HTTP host on localhost, Chinese
//! translations.
//!
//! ```toml
//! [host]
//! transport = "http"            # or "stdio"
//! url = "http://127.0.0.1:7400"
//! token_env = "TAGMERGE_TOKEN"  # optional bearer token source
//! timeout_secs = 30
//!
//! [merge]
//! language = "zh"
//! page_size = 500               # clamped to 1..=2000
//! dry_run = true
//! delete_source = true
//! max_merges = 0                # 0 = unlimited
//!
//! [output]
//! preview_limit = 200
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Largest page the host is asked for in a single `tags.list` call.
pub const MAX_PAGE_SIZE: u64 = 2000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HostTransport {
    #[default]
    Http,
    Stdio,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    #[serde(default)]
    pub transport: HostTransport,
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            transport: HostTransport::Http,
            url: default_url(),
            token_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_url() -> String {
    "http://127.0.0.1:7400".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct MergeConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default = "default_true")]
    pub delete_source: bool,
    #[serde(default)]
    pub max_merges: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            page_size: default_page_size(),
            dry_run: true,
            delete_source: true,
            max_merges: 0,
        }
    }
}

fn default_language() -> String {
    "zh".to_string()
}
fn default_page_size() -> u64 {
    500
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
        }
    }
}

fn default_preview_limit() -> usize {
    200
}

impl Config {
    /// All defaults. Used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

impl MergeConfig {
    /// Page size bounded to `1..=MAX_PAGE_SIZE`.
    pub fn effective_page_size(&self) -> u64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Merge cap, with `0` meaning "apply everything".
    pub fn merge_cap(&self) -> Option<usize> {
        (self.max_merges > 0).then_some(self.max_merges)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let config = parse_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// Parse `path` if it exists, otherwise fall back to [`Config::minimal`].
///
/// Not validated: the CLI layers its flags on top first and validates the
/// result.
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        parse_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn parse_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

pub fn validate(config: &Config) -> Result<()> {
    if config.host.transport == HostTransport::Http && config.host.url.trim().is_empty() {
        anyhow::bail!("host.url must be set when host.transport is 'http'");
    }

    if config.host.timeout_secs == 0 {
        anyhow::bail!("host.timeout_secs must be > 0");
    }

    if config.merge.language.trim().is_empty() {
        anyhow::bail!("merge.language must not be empty");
    }

    Ok(())
}
