use serde_json::{Map, Value};

use super::error::ToolError;
use super::handlers;
use super::tools::SCRAPE_TOOL;
use crate::scrape::{PageSource, Scraper};

/// Runs a tool by name with already-checked arguments.
///
/// A call resolves once its whole batch is complete; partial results are
/// never streamed back.
pub(crate) trait ToolExecutor {
    async fn execute(&self, tool: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError>;
}

/// Executor for the tools in `tools::tool_definitions`
pub(crate) struct BuiltinExecutor<S> {
    scraper: Scraper<S>,
}

impl<S: PageSource> BuiltinExecutor<S> {
    pub fn new(scraper: Scraper<S>) -> Self {
        Self { scraper }
    }
}

impl<S: PageSource> ToolExecutor for BuiltinExecutor<S> {
    async fn execute(&self, tool: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        match tool {
            SCRAPE_TOOL => handlers::scrape::handle(&self.scraper, arguments).await,
            _ => Err(ToolError::UnknownTool(tool.to_string())),
        }
    }
}
