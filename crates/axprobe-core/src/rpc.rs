//! JSON-RPC 2.0 line protocol for the MCP stdio transport.
//!
//! MCP servers speaking the stdio transport exchange one compact JSON-RPC
//! message per line: requests and notifications flow to the server's stdin,
//! responses (and any server-originated messages) come back on its stdout.
//!
//! # Message Shapes
//!
//! ```text
//! request:      {"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}
//! notification: {"jsonrpc":"2.0","method":"notifications/initialized"}
//! response:     {"jsonrpc":"2.0","id":1,"result":{...}}
//! error:        {"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"..."}}
//! ```
//!
//! Outbound messages use the typed [`RpcRequest`] / [`RpcNotification`]
//! structs. Inbound lines decode into the generic [`Incoming`] shape, since a
//! server may interleave its own notifications or requests with the response
//! the client is waiting for.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The only JSON-RPC version the protocol admits.
pub const JSONRPC_VERSION: &str = "2.0";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The message parsed as JSON but violates the JSON-RPC 2.0 shape.
    #[error("invalid JSON-RPC message: {0}")]
    InvalidMessage(String),
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// A request sent from the client to the server. Carries an id the server
/// must echo in its response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A one-way message with no id; the server must not respond to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcNotification {
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// Error object carried in a failed response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any message arriving from the server: a response, a notification, or a
/// server-originated request. Callers inspect the populated fields to decide
/// which it is.
#[derive(Debug, Clone, Deserialize)]
pub struct Incoming {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl Incoming {
    /// Returns `true` if this message is a response (success or error) rather
    /// than a notification or server-originated request.
    pub fn is_response(&self) -> bool {
        self.method.is_none() && (self.result.is_some() || self.error.is_some())
    }

    /// The message id as a u64, if present and numeric.
    pub fn id_u64(&self) -> Option<u64> {
        self.id.as_ref().and_then(Value::as_u64)
    }

    /// Check the message against the JSON-RPC 2.0 shape rules.
    ///
    /// - `jsonrpc` must be exactly `"2.0"`
    /// - at least one of `method`, `result`, `error` must be present
    /// - `result` and `error` are mutually exclusive
    /// - a response (no `method`) must carry an id
    pub fn validate(&self) -> Result<(), RpcError> {
        if self.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
            return Err(RpcError::InvalidMessage(
                "missing or invalid jsonrpc field".into(),
            ));
        }
        let has_method = self.method.is_some();
        let has_result = self.result.is_some();
        let has_error = self.error.is_some();

        if !has_method && !has_result && !has_error {
            return Err(RpcError::InvalidMessage(
                "message has none of method, result, error".into(),
            ));
        }
        if has_result && has_error {
            return Err(RpcError::InvalidMessage(
                "message has both result and error".into(),
            ));
        }
        if !has_method && self.id.is_none() {
            return Err(RpcError::InvalidMessage("response missing id".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Line helpers
// ---------------------------------------------------------------------------

/// Encode a message as a single compact JSON line, newline-terminated.
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String, RpcError> {
    Ok(serde_json::to_string(msg)? + "\n")
}

/// Decode one line from the server and validate its JSON-RPC shape.
pub fn decode_line(line: &str) -> Result<Incoming, RpcError> {
    let msg: Incoming = serde_json::from_str(line.trim())?;
    msg.validate()?;
    Ok(msg)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- Wire format verification --------------------------------------------

    #[test]
    fn request_wire_format() {
        let req = RpcRequest::new(1, "tools/list", Some(json!({})));
        let line = encode_line(&req).unwrap();
        assert_eq!(
            line,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\",\"params\":{}}\n"
        );
    }

    #[test]
    fn request_without_params_omits_field() {
        let req = RpcRequest::new(7, "ping", None);
        let line = encode_line(&req).unwrap();
        assert!(!line.contains("params"));
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn notification_has_no_id() {
        let note = RpcNotification::new("notifications/initialized", None);
        let line = encode_line(&note).unwrap();
        assert_eq!(
            line,
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n"
        );
    }

    // -- Decoding -------------------------------------------------------------

    #[test]
    fn decode_success_response() {
        let msg = decode_line(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#).unwrap();
        assert!(msg.is_response());
        assert_eq!(msg.id_u64(), Some(3));
        assert!(msg.error.is_none());
    }

    #[test]
    fn decode_error_response() {
        let msg = decode_line(
            r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert!(msg.is_response());
        let err = msg.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
    }

    #[test]
    fn decode_server_notification() {
        let msg = decode_line(
            r#"{"jsonrpc":"2.0","method":"notifications/progress","params":{"progress":1}}"#,
        )
        .unwrap();
        assert!(!msg.is_response());
        assert_eq!(msg.method.as_deref(), Some("notifications/progress"));
    }

    #[test]
    fn decode_tolerates_surrounding_whitespace() {
        let msg = decode_line("  {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n").unwrap();
        assert_eq!(msg.id_u64(), Some(1));
    }

    // -- Shape validation -------------------------------------------------------

    #[test]
    fn reject_missing_jsonrpc() {
        let result = decode_line(r#"{"id":1,"method":"test"}"#);
        assert!(matches!(result, Err(RpcError::InvalidMessage(_))));
    }

    #[test]
    fn reject_wrong_jsonrpc_version() {
        let result = decode_line(r#"{"jsonrpc":"1.0","id":1,"method":"test"}"#);
        assert!(matches!(result, Err(RpcError::InvalidMessage(_))));
    }

    #[test]
    fn reject_result_and_error_together() {
        let result = decode_line(
            r#"{"jsonrpc":"2.0","id":1,"result":{},"error":{"code":-1,"message":"x"}}"#,
        );
        assert!(matches!(result, Err(RpcError::InvalidMessage(_))));
    }

    #[test]
    fn reject_response_without_id() {
        let result = decode_line(r#"{"jsonrpc":"2.0","result":{}}"#);
        assert!(matches!(result, Err(RpcError::InvalidMessage(_))));
    }

    #[test]
    fn reject_empty_message() {
        let result = decode_line(r#"{"jsonrpc":"2.0","id":1}"#);
        assert!(matches!(result, Err(RpcError::InvalidMessage(_))));
    }

    #[test]
    fn reject_non_json_line() {
        let result = decode_line("not json at all");
        assert!(matches!(result, Err(RpcError::Json(_))));
    }

    // -- Id handling ------------------------------------------------------------

    #[test]
    fn string_id_is_not_u64() {
        let msg = decode_line(r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#).unwrap();
        assert!(msg.is_response());
        assert_eq!(msg.id_u64(), None);
    }
}
