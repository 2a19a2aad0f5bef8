//! lilfetch MCP Server
//!
//! Speaks the Model Context Protocol over stdin/stdout so MCP clients can
//! turn web pages into Markdown. Diagnostics go to stderr.

use anyhow::Result;

mod config;
mod extract;
mod logging;
mod mcp;
mod scrape;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::load()?;
    logging::init(&config.logging)?;

    mcp::transport::serve_stdio(&config).await
}
