//! linkpeek server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use linkpeek_client::FetchCoordinator;
use linkpeek_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let coordinator = FetchCoordinator::from_config(&config)?;

    tracing::info!(
        persistent_cache = config.persistent_cache,
        db_path = %config.db_path.display(),
        "Starting linkpeek server on stdio transport"
    );

    let handler = handler::LinkPeekServer::new(coordinator.clone(), config);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    coordinator.close().await;

    Ok(())
}
