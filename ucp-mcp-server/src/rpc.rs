//! JSON-RPC 2.0 handling for the MCP stdio transport.
//!
//! Each input line is one request. [`McpServer::handle_line`] returns the
//! response line, or `None` for notifications.

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use ucp_toolkit::{Toolkit, ToolkitError};

/// MCP protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name announced in `initialize`.
pub const SERVER_NAME: &str = "ucp-mcp-server";

/// Invalid JSON.
pub const PARSE_ERROR: i64 = -32700;
/// Valid JSON that is not a request object.
pub const INVALID_REQUEST: i64 = -32600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Bad or missing parameters.
pub const INVALID_PARAMS: i64 = -32602;

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be `"2.0"`.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// Request id. `None` only when the member is absent, which marks a
    /// notification; an explicit `null` id is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Builds a success response.
#[must_use]
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

/// Builds an error response.
#[must_use]
pub fn rpc_error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message.into() } })
}

/// MCP server over a [`Toolkit`].
#[derive(Debug)]
pub struct McpServer {
    toolkit: Toolkit,
}

impl McpServer {
    /// Wraps a toolkit.
    #[must_use]
    pub const fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    /// Returns the wrapped toolkit.
    #[must_use]
    pub const fn toolkit(&self) -> &Toolkit {
        &self.toolkit
    }

    /// Handles one input line and returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparseable request line");
                return Some(rpc_error(Value::Null, PARSE_ERROR, "Parse error").to_string());
            }
        };

        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "malformed request");
                return Some(rpc_error(Value::Null, INVALID_REQUEST, "Invalid Request").to_string());
            }
        };

        self.handle_request(request).await.map(|response| response.to_string())
    }

    /// Dispatches a decoded request. Notifications produce `None`; a request
    /// without `jsonrpc: "2.0"` is answered with an invalid-request error.
    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<Value> {
        if request.jsonrpc.as_deref() != Some("2.0") {
            warn!(jsonrpc = ?request.jsonrpc, "unsupported protocol version");
            let id = request.id.unwrap_or(Value::Null);
            return Some(rpc_error(id, INVALID_REQUEST, "Invalid Request: jsonrpc must be \"2.0\""));
        }
        let Some(id) = request.id else {
            debug!("notification");
            return None;
        };
        let params = request.params.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => rpc_success(id, initialize_result()),
            "tools/list" => rpc_success(id, json!({ "tools": self.toolkit.definitions() })),
            "tools/call" => self.call_tool(id, &params).await,
            "ping" => rpc_success(id, json!({})),
            other => {
                warn!(method = other, "unknown method");
                rpc_error(id, METHOD_NOT_FOUND, format!("Method not found: {other}"))
            }
        };

        Some(response)
    }

    async fn call_tool(&self, id: Value, params: &Value) -> Value {
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return rpc_error(id, INVALID_PARAMS, "Missing tool name");
        };
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

        match self.toolkit.call(name, arguments).await {
            Ok(output) => {
                info!(tool = name, "tool succeeded");
                let mut result = json!({
                    "content": [{ "type": "text", "text": output.text }],
                    "isError": false,
                });
                if let Some(data) = output.data {
                    result["structuredContent"] = data;
                }
                rpc_success(id, result)
            }
            Err(e @ (ToolkitError::UnknownTool(_) | ToolkitError::InvalidArguments { .. })) => {
                rpc_error(id, INVALID_PARAMS, e.to_string())
            }
            Err(e) => {
                warn!(tool = name, error = %e, "tool failed");
                rpc_success(
                    id,
                    json!({
                        "content": [{ "type": "text", "text": e.to_string() }],
                        "isError": true,
                    }),
                )
            }
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        }
    })
}
