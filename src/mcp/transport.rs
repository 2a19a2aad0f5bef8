//! Stdio transport
//!
//! One request line in, one response line out, strictly in order: the
//! response to line N is written and flushed before line N+1 is read.

use std::io;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::McpServer;
use super::executor::ToolExecutor;
use super::protocol::JsonRpcResponse;
use crate::config::Config;

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shutdown {
    EndOfInput,
    Interrupted,
}

/// Serve requests from `reader` until end of input
pub(crate) async fn serve<E, R, W>(server: &McpServer<E>, reader: R, mut writer: W) -> Result<()>
where
    E: ToolExecutor,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let response = server.handle_line(&line).await;
        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<()> {
    // Compact serialization escapes newlines, so this is exactly one line
    let mut line = serde_json::to_string(response)?;
    line.push('\n');

    writer
        .write_all(line.as_bytes())
        .await
        .context("Failed to write response")?;
    writer.flush().await?;

    if let Some(error) = response.error_object() {
        debug!(id = %response.id, code = error.code, "Wrote error response");
    } else {
        debug!(id = %response.id, "Wrote response");
    }
    Ok(())
}

/// Serve until end of input or until `interrupt` resolves with `Ok`
///
/// If the interrupt listener itself fails, serving carries on to end of input.
pub(crate) async fn serve_until<E, R, W, I>(
    server: &McpServer<E>,
    reader: R,
    writer: W,
    interrupt: I,
) -> Result<Shutdown>
where
    E: ToolExecutor,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    I: Future<Output = io::Result<()>>,
{
    let serving = serve(server, reader, writer);
    tokio::pin!(serving);

    tokio::select! {
        res = &mut serving => {
            res?;
            info!("stdin closed, shutting down");
            Ok(Shutdown::EndOfInput)
        }
        res = interrupt => match res {
            Ok(()) => {
                info!("Interrupted, shutting down");
                Ok(Shutdown::Interrupted)
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl-C, serving until end of input");
                serving.await?;
                info!("stdin closed, shutting down");
                Ok(Shutdown::EndOfInput)
            }
        },
    }
}

/// Run over the process's stdin/stdout until stdin closes or Ctrl-C
pub(crate) async fn run_stdio<E: ToolExecutor>(server: &McpServer<E>) -> Result<Shutdown> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    serve_until(server, stdin, stdout, tokio::signal::ctrl_c()).await
}

/// Build the HTTP-backed server from config and serve stdio
pub(crate) async fn serve_stdio(config: &Config) -> Result<()> {
    let server = McpServer::from_config(config)?;
    info!(version = env!("CARGO_PKG_VERSION"), "lilfetch MCP server ready");

    if run_stdio(&server).await? == Shutdown::Interrupted {
        // tokio's stdin read is a blocking thread that cannot be cancelled;
        // returning would wait on it until the next line arrives
        std::process::exit(0);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::test_support::stub_server;
    use crate::scrape::stub::StubSource;
    use std::time::Duration;
    use tokio_test::io::Builder;

    async fn response_line<E: ToolExecutor>(server: &McpServer<E>, request: &str) -> String {
        let mut line = serde_json::to_string(&server.handle_line(request).await).unwrap();
        line.push('\n');
        line
    }

    #[tokio::test]
    async fn test_serves_until_end_of_input() {
        let server = stub_server(StubSource::default());
        let input = b"{\"id\":1,\"method\":\"notify/ping\"}\n\n   \nnot json\n{\"id\":2,\"method\":\"initialize\"}\n";
        let mut output = Vec::new();

        serve(&server, &input[..], &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let responses: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        // Blank lines are skipped, bad lines don't stop the loop
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], serde_json::json!(1));
        assert_eq!(responses[0]["error"]["code"], serde_json::json!(-32601));
        assert_eq!(responses[1]["id"], serde_json::Value::Null);
        assert_eq!(responses[1]["error"]["code"], serde_json::json!(-32700));
        assert_eq!(responses[2]["id"], serde_json::json!(2));
        assert!(responses[2]["result"].is_object());
        assert!(text.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_response_written_before_next_request_is_read() {
        let source = StubSource::default()
            .with_page("https://a.example", "text/plain", "first")
            .with_page("https://b.example", "text/plain", "second");
        let server = stub_server(source);

        let first = r#"{"id":1,"method":"tools/call","params":{"name":"scrape_to_markdown","arguments":{"urls":["https://a.example"]}}}"#;
        let second = r#"{"id":2,"method":"tools/call","params":{"name":"scrape_to_markdown","arguments":{"urls":["https://b.example"]}}}"#;

        let first_response = response_line(&server, first).await;
        let second_response = response_line(&server, second).await;

        // The mock only hands out the second request after the first response
        // is written; reading early would stall, hence the timeout
        let mock = Builder::new()
            .read(format!("{first}\n").as_bytes())
            .write(first_response.as_bytes())
            .read(format!("{second}\n").as_bytes())
            .write(second_response.as_bytes())
            .build();

        let (reader, writer) = tokio::io::split(mock);
        tokio::time::timeout(
            Duration::from_secs(5),
            serve(&server, BufReader::new(reader), writer),
        )
        .await
        .expect("serve stalled waiting for input")
        .unwrap();
    }

    #[tokio::test]
    async fn test_interrupt_stops_serving() {
        let server = stub_server(StubSource::default());
        // Holding the other end open keeps the reader pending
        let (_client, server_end) = tokio::io::duplex(64);

        let shutdown = serve_until(
            &server,
            BufReader::new(server_end),
            tokio::io::sink(),
            async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(shutdown, Shutdown::Interrupted);
    }

    #[tokio::test]
    async fn test_failed_interrupt_listener_keeps_serving() {
        let server = stub_server(StubSource::default());
        let input = b"{\"id\":1,\"method\":\"initialize\"}\n";
        let mut output = Vec::new();

        let shutdown = serve_until(
            &server,
            &input[..],
            &mut output,
            async { Err(io::Error::other("signal driver unavailable")) },
        )
        .await
        .unwrap();

        assert_eq!(shutdown, Shutdown::EndOfInput);
        let response: serde_json::Value =
            serde_json::from_slice(output.strip_suffix(b"\n").unwrap()).unwrap();
        assert_eq!(response["id"], serde_json::json!(1));
        assert!(response["result"].is_object());
    }
}
