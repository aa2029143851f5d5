//! Stdin/stdout JSON bridge for the tool host.
//!
//! Reads newline-delimited [`RequestEnvelope`] messages, runs each one on the
//! blocking pool, and writes one [`ResponseEnvelope`] line per request.
//! Requests are handled one at a time, in order.
//!
//! Stdout is exclusively reserved for the JSON protocol; all diagnostic
//! output (tracing, logs) must be routed to stderr.
//!
//! [`RequestEnvelope`]: super::contract::RequestEnvelope

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};

use crate::tools::ToolRegistry;

use super::contract::{ResponseEnvelope, dispatch, parse_request};

/// Run the bridge on the process's stdin and stdout until stdin closes.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read or stdout cannot be written.
pub async fn run_stdio_bridge(registry: Arc<ToolRegistry>) -> io::Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = BufWriter::new(tokio::io::stdout());
    run_bridge(registry, reader, writer).await
}

/// Run the bridge over arbitrary streams until `reader` reaches EOF.
///
/// # Errors
///
/// Returns an I/O error if reading or writing fails.
pub async fn run_bridge<R, W>(registry: Arc<ToolRegistry>, mut reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            tracing::info!("stdin closed (EOF); shutting down stdio bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match parse_request(trimmed) {
            Ok(request) => {
                let id = request.id.clone();
                let registry = Arc::clone(&registry);
                // Tool calls wait on an external interpreter.
                match tokio::task::spawn_blocking(move || dispatch(&registry, request)).await {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::error!(error = %e, "request handler panicked");
                        ResponseEnvelope::error(id, format!("request handler failed: {e}"))
                    }
                }
            }
            Err(response) => response,
        };

        write_line(&mut writer, &response).await?;
    }
    Ok(())
}

/// Write a single JSON line and flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, response: &ResponseEnvelope) -> io::Result<()> {
    let json = serde_json::to_string(response).map_err(io::Error::other)?;
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
