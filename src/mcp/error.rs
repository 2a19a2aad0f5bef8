use thiserror::Error;

use super::protocol::JsonRpcError;

pub(crate) const PARSE_ERROR: i32 = -32700;
pub(crate) const METHOD_NOT_FOUND: i32 = -32601;
pub(crate) const INVALID_PARAMS: i32 = -32602;
pub(crate) const INTERNAL_ERROR: i32 = -32603;

/// Protocol-level failures, each answered with a JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum RpcError {
    #[error("Parse error")]
    Parse,
    #[error("Method not found")]
    MethodNotFound,
    #[error("Tool not found")]
    ToolNotFound,
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("{0}")]
    Internal(String),
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::Parse => PARSE_ERROR,
            RpcError::MethodNotFound | RpcError::ToolNotFound => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<RpcError> for JsonRpcError {
    fn from(error: RpcError) -> Self {
        JsonRpcError {
            code: error.code(),
            message: error.to_string(),
            data: None,
        }
    }
}

/// Failures reported by a tool executor
#[derive(Debug, Error)]
pub(crate) enum ToolError {
    #[error("{0}")]
    InvalidParams(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<ToolError> for RpcError {
    fn from(error: ToolError) -> Self {
        match error {
            ToolError::InvalidParams(message) => RpcError::InvalidParams(message),
            ToolError::UnknownTool(_) => RpcError::ToolNotFound,
            ToolError::Failed(e) => RpcError::Internal(format!("{:#}", e)),
        }
    }
}
