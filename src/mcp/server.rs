//! MCP Stdio Server
//!
//! Reads line-delimited JSON-RPC messages from stdin and writes responses to stdout.
//! Each request runs in its own task so slow upstream calls do not block other requests;
//! a single writer task owns stdout so response lines never interleave.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::mcp::error::McpError;
use crate::mcp::handler::McpHandler;
use crate::mcp::protocol::JsonRpcResponse;

/// Capacity of the response queue feeding the writer task
const RESPONSE_QUEUE_CAPACITY: usize = 64;

pub struct McpStdioServer {
    handler: McpHandler,
}

impl McpStdioServer {
    pub fn new(handler: McpHandler) -> Self {
        Self { handler }
    }

    /// Serve stdin/stdout until EOF
    pub async fn run(&self) -> anyhow::Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve any line-oriented reader/writer pair until the reader hits EOF.
    ///
    /// Returns after every in-flight request has written its response.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(tools = self.handler.registry().len(), "Starting MCP stdio server");

        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(RESPONSE_QUEUE_CAPACITY);
        let writer_task = tokio::spawn(write_responses(rx, writer));

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line.trim().to_string(),
                Err(e) => {
                    warn!(error = %e, bytes = buf.len(), "Received line that is not valid UTF-8");
                    let parse_error = McpError::ParseError(format!("Invalid UTF-8: {}", e));
                    let response = JsonRpcResponse::failure(None, parse_error.to_json_rpc_error());
                    if tx.send(response).await.is_err() {
                        error!("Response writer closed; dropping response");
                    }
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }

            let handler = self.handler.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                if let Some(response) = handler.handle_line(&line).await {
                    if tx.send(response).await.is_err() {
                        error!("Response writer closed; dropping response");
                    }
                }
            });
        }

        // In-flight tasks hold their own senders; the writer drains until they finish.
        drop(tx);
        writer_task.await??;

        info!("MCP stdio server shutting down (EOF received)");
        Ok(())
    }
}

async fn write_responses<W>(mut rx: mpsc::Receiver<JsonRpcResponse>, mut writer: W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let json = serde_json::to_string(&response)?;
        debug!(id = ?response.id, bytes = json.len(), "Writing response");

        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::N8nConfig;
    use crate::mcp::registry::ToolRegistry;
    use crate::n8n::N8nClient;
    use serde_json::Value;
    use std::sync::Arc;

    fn server() -> McpStdioServer {
        let client = N8nClient::new(N8nConfig::new("http://127.0.0.1:1/api/v1", "key"))
            .expect("client");
        let registry = ToolRegistry::with_n8n_tools().expect("registry");
        McpStdioServer::new(McpHandler::new(Arc::new(registry), client))
    }

    #[tokio::test]
    async fn test_serves_until_eof() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            "garbage\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let (client_end, mut server_end) = tokio::io::duplex(1 << 20);

        server().serve(input.as_bytes(), client_end).await.expect("serve");

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut server_end, &mut output)
            .await
            .expect("read output");

        let responses: Vec<Value> =
            output.lines().map(|l| serde_json::from_str(l).expect("json line")).collect();
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().any(|r| r["id"] == 1 && r["result"].is_object()));
        assert!(responses.iter().any(|r| r["id"].is_null() && r["error"]["code"] == -32700));
        assert!(responses.iter().any(|r| r["id"] == 2 && r["result"]["tools"].is_array()));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_gets_parse_error_and_serving_continues() {
        let mut input: Vec<u8> = Vec::new();
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":\"\xff\xfe\",\"method\":\"ping\"}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');
        let (client_end, mut server_end) = tokio::io::duplex(1 << 20);

        server().serve(input.as_slice(), client_end).await.expect("serve");

        let mut output = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut server_end, &mut output)
            .await
            .expect("read output");

        let responses: Vec<Value> =
            output.lines().map(|l| serde_json::from_str(l).expect("json line")).collect();
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().any(|r| r["id"].is_null() && r["error"]["code"] == -32700));
        assert!(responses.iter().any(|r| r["id"] == 2 && r["result"].is_object()));
    }
}
