//! Line-delimited JSON-RPC host binding.
//!
//! Used when tagmerge runs as a plugin subprocess: requests are written to
//! stdout and responses are read back from stdin, one JSON object per line.
//!
//! ```text
//! → {"id":1,"method":"tags.list","params":{"language":"zh","limit":500,"offset":0}}
//! ← {"id":1,"result":{"total":2,"limit":500,"offset":0,"items":[...]}}
//! → {"id":2,"method":"tags.merge","params":{"source_id":4,"target_id":9,"delete_source":true}}
//! ← {"id":2,"error":{"code":"not_found","message":"no tag 9"}}
//! ```
//!
//! Calls are strictly sequential; a response must carry the id of the
//! request it answers.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

use crate::host::TagHost;
use crate::host_http::RpcError;
use crate::models::TagPage;

struct Channel<R, W> {
    reader: BufReader<R>,
    writer: W,
    next_id: u64,
}

pub struct StdioHost<R, W> {
    channel: Mutex<Channel<R, W>>,
}

#[derive(Deserialize)]
struct StdioResponse {
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

impl StdioHost<tokio::io::Stdin, tokio::io::Stdout> {
    /// Talk to the parent process over this process's stdin/stdout.
    pub fn from_process() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> StdioHost<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            channel: Mutex::new(Channel {
                reader: BufReader::new(reader),
                writer,
                next_id: 1,
            }),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let mut channel = self.channel.lock().await;
        let id = channel.next_id;
        channel.next_id += 1;

        let mut line = serde_json::to_string(&json!({
            "id": id,
            "method": method,
            "params": params,
        }))?;
        line.push('\n');
        channel
            .writer
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("failed to send {} request", method))?;
        channel.writer.flush().await?;

        let mut buf = String::new();
        loop {
            buf.clear();
            let n = channel
                .reader
                .read_line(&mut buf)
                .await
                .with_context(|| format!("failed to read {} response", method))?;
            if n == 0 {
                bail!("host closed the channel while waiting for {}", method);
            }
            if !buf.trim().is_empty() {
                break;
            }
        }

        let response: StdioResponse = serde_json::from_str(buf.trim())
            .with_context(|| format!("{} response is not valid JSON", method))?;
        if response.id != Some(id) {
            bail!(
                "{} response id mismatch: expected {}, got {:?}",
                method,
                id,
                response.id
            );
        }
        if let Some(error) = response.error {
            bail!("{} failed: {}", method, error);
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl<R, W> TagHost for StdioHost<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "stdio"
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
