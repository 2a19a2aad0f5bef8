use std::collections::HashSet;

use serde_json::json;
use thiserror::Error;

use super::protocol::ToolDescriptor;

pub(crate) const SCRAPE_TOOL: &str = "scrape_to_markdown";

#[derive(Debug, Error, PartialEq)]
pub(crate) enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateName(String),
}

/// Ordered, immutable catalog of the tools this server exposes
#[derive(Debug, Clone)]
pub(crate) struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(RegistryError::DuplicateName(tool.name.clone()));
            }
        }
        Ok(Self { tools })
    }

    /// Registry holding the built-in tools
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(tool_definitions())
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }
}

/// Return all MCP tool definitions
pub(crate) fn tool_definitions() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: SCRAPE_TOOL.to_string(),
        description: "Scrape one or more URLs to clean Markdown for READMEs or workflows."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of URLs to scrape"
                },
                "description": {
                    "type": "string",
                    "default": "scrape",
                    "description": "Label for output metadata"
                }
            },
            "required": ["urls"]
        }),
    }]
}
