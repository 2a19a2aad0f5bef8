use anyhow::Context;
use serde_json::{Map, Value};

use crate::mcp::error::ToolError;
use crate::mcp::helpers::{extract_optional_str, extract_string_array};
use crate::scrape::{PageSource, Scraper};

/// Validated arguments of `scrape_to_markdown`
#[derive(Debug, PartialEq)]
pub(crate) struct ScrapeArgs {
    pub urls: Vec<String>,
    pub label: String,
}

impl ScrapeArgs {
    pub fn parse(args: &Map<String, Value>, default_label: &str) -> Result<Self, ToolError> {
        let urls = extract_string_array(args, "urls")
            .map_err(ToolError::InvalidParams)?
            .unwrap_or_default();

        if urls.is_empty() {
            return Err(ToolError::InvalidParams("No URLs provided".to_string()));
        }

        let label = extract_optional_str(args, "description")
            .map_err(ToolError::InvalidParams)?
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(default_label)
            .to_string();

        Ok(Self { urls, label })
    }
}

/// Scrape a batch of URLs; per-URL failures are data in the returned list
pub(crate) async fn handle<S: PageSource>(
    scraper: &Scraper<S>,
    args: &Map<String, Value>,
) -> Result<Value, ToolError> {
    let ScrapeArgs { urls, label } = ScrapeArgs::parse(args, scraper.default_label())?;

    let results = scraper.scrape_batch(&urls, &label).await;

    let value = serde_json::to_value(&results).context("Failed to serialize scrape results")?;
    Ok(value)
}
