//! Headless host exposing the contact tools over stdin/stdout.
//!
//! Reads newline-delimited JSON requests from stdin and writes one JSON
//! response line per request to stdout.

use std::sync::Arc;

use anyhow::Context;
use contacts_bridge::config::ContactsConfig;
use contacts_bridge::host::run_stdio_bridge;
use contacts_bridge::{ContactDirectory, OsascriptExecutor, build_registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise tracing to stderr only (stdout is reserved for the JSON
    // protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ContactsConfig::load().context("failed to load configuration")?;
    tracing::info!(
        interpreter = %config.executor.interpreter,
        timeout_secs = config.executor.timeout_secs,
        mode = ?config.tool_mode,
        "contacts-host starting"
    );

    let executor = Arc::new(OsascriptExecutor::new(&config.executor));
    let directory = Arc::new(ContactDirectory::new(executor, config.limits.clone()));
    let registry = Arc::new(build_registry(directory, config.tool_mode));
    tracing::info!(tools = ?registry.list_available(), "contact tools registered");

    run_stdio_bridge(registry).await.map_err(|e| {
        tracing::error!(error = %e, "contacts-host exited with error");
        anyhow::anyhow!("contacts-host failed: {e}")
    })?;

    tracing::info!("contacts-host stopped");
    Ok(())
}
