//! JSON-over-HTTP host binding.
//!
//! Every call is a `POST {url}/rpc` with a body of the form
//! `{"method": "tags.list", "params": {...}}`. The host answers with
//! `{"result": ...}` on success, or with `{"error": {"code", "message"}}`
//! (any status) on failure.
//!
//! No retries are attempted: a network error, a non-2xx status, or an
//! error body all fail the call immediately.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::HostConfig;
use crate::host::TagHost;
use crate::models::TagPage;

pub struct HttpHost {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
pub(crate) struct RpcError {
    #[serde(default)]
    pub(crate) code: Option<Value>,
    #[serde(default)]
    pub(crate) message: String,
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(Value::String(code)) => write!(f, "{}: {}", code, self.message),
            Some(code) => write!(f, "{}: {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl HttpHost {
    /// Build a client for `config.url`.
    ///
    /// When `token_env` is set, the named environment variable must exist;
    /// its value is sent as a bearer token.
    pub fn new(config: &HostConfig) -> Result<Self> {
        let token = match &config.token_env {
            Some(var) => Some(
                std::env::var(var)
                    .with_context(|| format!("{} environment variable not set", var))?,
            ),
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rpc", config.url.trim_end_matches('/')),
            token,
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "method": method, "params": params }));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{} request to {} failed", method, self.endpoint))?;
        let status = response.status();
        let body_text = response
            .text()
            .await
            .with_context(|| format!("failed to read {} response from {}", method, self.endpoint))?;

        let parsed: Option<RpcResponse> = serde_json::from_str(&body_text).ok();
        if let Some(error) = parsed.as_ref().and_then(|r| r.error.as_ref()) {
            bail!("{} failed ({}): {}", method, status, error);
        }
        if !status.is_success() {
            bail!("{} failed with HTTP {}: {}", method, status, body_text);
        }

        match parsed {
            Some(RpcResponse { result, .. }) => Ok(result.unwrap_or(Value::Null)),
            None => bail!("{} returned a non-JSON body: {}", method, body_text),
        }
    }
}

#[async_trait]
impl TagHost for HttpHost {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_tags(&self, language: &str, limit: u64, offset: u64) -> Result<TagPage> {
        let result = self
            .call(
                "tags.list",
                json!({ "language": language, "limit": limit, "offset": offset }),
            )
            .await?;
        serde_json::from_value(result).context("tags.list returned a malformed page")
    }

    async fn merge_tags(&self, source_id: i64, target_id: i64, delete_source: bool) -> Result<()> {
        self.call(
            "tags.merge",
            json!({
                "source_id": source_id,
                "target_id": target_id,
                "delete_source": delete_source,
            }),
        )
        .await?;
        Ok(())
    }
}
