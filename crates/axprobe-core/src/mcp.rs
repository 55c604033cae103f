//! Typed payloads for the MCP operations the probe consumes.
//!
//! These structs mirror the handshake and tool-call envelopes of the Model
//! Context Protocol. Only the fields the probe reads are modeled; unknown
//! fields are ignored on deserialization, so richer servers remain
//! compatible.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol revision sent during the `initialize` handshake.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Client name advertised to the server.
pub const CLIENT_NAME: &str = "axprobe";

/// Identity block a server reports in its `initialize` result.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: String,

    #[serde(rename = "serverInfo", default)]
    pub server_info: Option<ServerInfo>,

    /// Capability flags as reported by the server; opaque to the probe.
    #[serde(default)]
    pub capabilities: Value,
}

/// One named operation from the `tools/list` capability discovery call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Result of the `tools/list` request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ToolsListResult {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
}

/// One item in a tool result's `content` array. The probe only ever reads
/// text items; other kinds (images, resources) are carried but unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Envelope returned by a `tools/call` request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,

    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    /// The first text payload in the content array, if any.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|c| c.kind == "text")
            .and_then(|c| c.text.as_deref())
    }

    /// Returns `true` if the server flagged this result as a tool-level error.
    pub fn failed(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}
