//! JSON-RPC request and response message types.
//!
//! Defines the message format for calls from the session to the node and
//! the node's replies.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

use super::RpcMethod;

// ============================================================================
// Constants
// ============================================================================

/// JSON-RPC protocol version marker.
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// Request
// ============================================================================

/// A JSON-RPC call from the session to the node.
///
/// # Format
///
/// ```json
/// {
///   "jsonrpc": "2.0",
///   "id": 1,
///   "method": "chain_getBlockHash",
///   "params": [0]
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: &'static str,

    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Method name.
    pub method: &'static str,

    /// Positional parameters.
    pub params: Value,
}

impl Request {
    /// Creates a new request with auto-generated ID.
    #[inline]
    #[must_use]
    pub fn new(method: RpcMethod) -> Self {
        Self::with_id(RequestId::generate(), method)
    }

    /// Creates a new request with specific ID.
    #[inline]
    #[must_use]
    pub fn with_id(id: RequestId, method: RpcMethod) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.name(),
            params: method.params(),
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply from the node to a [`Request`].
///
/// # Format
///
/// Success:
/// ```json
/// { "jsonrpc": "2.0", "id": 1, "result": "0x..." }
/// ```
///
/// Error:
/// ```json
/// { "jsonrpc": "2.0", "id": 1, "error": { "code": 1010, "message": "Invalid Transaction" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error object (if error).
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Response {
    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if response was error.
    ///
    /// A success with a missing `result` yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rpc`] if the node replied with an error object.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(error.into()),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// RpcError
// ============================================================================

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: i64,

    /// Short description.
    pub message: String,

    /// Optional detail.
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<RpcError> for Error {
    fn from(error: RpcError) -> Self {
        let message = match error.data {
            Some(Value::String(detail)) => format!("{}: {detail}", error.message),
            Some(Value::Null) | None => error.message,
            Some(other) => format!("{}: {other}", error.message),
        };
        Error::rpc(error.code, message)
    }
}

// ============================================================================
// Tests
// ============================================================================
