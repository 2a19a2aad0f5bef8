use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::RpcError;

pub(crate) const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 Request, after envelope normalization
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct JsonRpcRequest {
    /// Echoed verbatim; `Null` when absent
    pub id: Value,
    /// `None` when absent or not a string, which dispatches as an unknown method
    pub method: Option<String>,
    pub params: Map<String, Value>,
}

/// A line that could not be turned into a request, with whatever id was recovered
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RejectedRequest {
    pub id: Value,
    pub error: RpcError,
}

impl JsonRpcRequest {
    /// Parse one line of input (trailing newline already stripped)
    pub fn parse(line: &str) -> Result<Self, RejectedRequest> {
        let value: Value = serde_json::from_str(line).map_err(|_| RejectedRequest {
            id: Value::Null,
            error: RpcError::Parse,
        })?;

        let Value::Object(mut envelope) = value else {
            return Err(RejectedRequest {
                id: Value::Null,
                error: RpcError::Internal("request must be a JSON object".to_string()),
            });
        };

        let id = envelope.remove("id").unwrap_or(Value::Null);
        let method = match envelope.remove("method") {
            Some(Value::String(method)) => Some(method),
            _ => None,
        };
        // Only the envelope is checked here; methods that need params fail on
        // the missing keys themselves
        let params = match envelope.remove("params") {
            Some(Value::Object(params)) => params,
            _ => Map::new(),
        };

        Ok(Self { id, method, params })
    }
}

/// JSON-RPC 2.0 Response
///
/// `outcome` flattens to exactly one of `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Error(error.into()),
        }
    }

    #[cfg(test)]
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&JsonRpcError> {
        match &self.outcome {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

impl From<RejectedRequest> for JsonRpcResponse {
    fn from(rejected: RejectedRequest) -> Self {
        Self::error(rejected.id, rejected.error)
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP Tool definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}
