pub(crate) mod error;
pub(crate) mod executor;
pub(crate) mod handlers;
pub(crate) mod helpers;
pub(crate) mod protocol;
pub(crate) mod tools;
pub(crate) mod transport;

use std::any::Any;
use std::panic::AssertUnwindSafe;

use anyhow::Result;
use futures::FutureExt;
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::config::Config;
use crate::scrape::{HttpPageSource, Scraper};
use error::RpcError;
use executor::{BuiltinExecutor, ToolExecutor};
use protocol::{JsonRpcRequest, JsonRpcResponse};
use tools::ToolRegistry;

const SERVER_NAME: &str = "lilfetch";
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP Server implementation
///
/// Holds no per-request state; the registry is fixed at construction.
pub(crate) struct McpServer<E> {
    registry: ToolRegistry,
    executor: E,
}

impl McpServer<BuiltinExecutor<HttpPageSource>> {
    /// Server with the built-in tools fetching over HTTP
    pub fn from_config(config: &Config) -> Result<Self> {
        let scraper = Scraper::new(HttpPageSource::new(config)?, config);
        Ok(Self::new(ToolRegistry::builtin()?, BuiltinExecutor::new(scraper)))
    }
}

impl<E: ToolExecutor> McpServer<E> {
    pub fn new(registry: ToolRegistry, executor: E) -> Self {
        Self { registry, executor }
    }

    /// Handle one raw input line. Never fails: every outcome is a response.
    pub async fn handle_line(&self, line: &str) -> JsonRpcResponse {
        let request = match JsonRpcRequest::parse(line) {
            Ok(request) => request,
            Err(rejected) => {
                debug!(error = %rejected.error, "Rejected request line");
                return rejected.into();
            }
        };

        let id = request.id.clone();
        match AssertUnwindSafe(self.handle_request(request))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(id = %id, panic = %message, "Request handler panicked");
                JsonRpcResponse::error(id, RpcError::Internal(message))
            }
        }
    }

    /// Handle incoming JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest { id, method, params } = request;
        debug!(id = %id, method = method.as_deref().unwrap_or("<none>"), "Request");

        match self.dispatch(method.as_deref(), &params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                match &e {
                    RpcError::Internal(message) => error!(id = %id, error = %message, "Internal error"),
                    other => debug!(id = %id, code = other.code(), error = %other, "Error response"),
                }
                JsonRpcResponse::error(id, e)
            }
        }
    }

    async fn dispatch(&self, method: Option<&str>, params: &Map<String, Value>) -> Result<Value, RpcError> {
        match method {
            Some("initialize") => Ok(self.handle_initialize()),
            Some("tools/list") => Ok(json!({ "tools": self.registry.tools() })),
            Some("tools/call") => self.handle_tools_call(params).await,
            _ => Err(RpcError::MethodNotFound),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "resources": {},
                "prompts": {},
                "roots": []
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Handle tools/call request: resolve the tool and execute it
    async fn handle_tools_call(&self, params: &Map<String, Value>) -> Result<Value, RpcError> {
        let tool = params
            .get("name")
            .and_then(|v| v.as_str())
            .and_then(|name| self.registry.get(name))
            .ok_or(RpcError::ToolNotFound)?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments.clone(),
            Some(_) => {
                return Err(RpcError::InvalidParams(
                    "arguments must be an object".to_string(),
                ));
            }
        };

        // The tool validates its own arguments
        let results = self.executor.execute(&tool.name, &arguments).await?;
        let text = serde_json::to_string_pretty(&results)
            .map_err(|e| RpcError::Internal(e.to_string()))?;

        Ok(json!({
            "content": [{
                "type": "text",
                "text": text
            }],
            "isError": false
        }))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "request handler panicked".to_string())
}
