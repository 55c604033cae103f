//! Async client for MCP automation servers over stdio.
//!
//! This module provides [`McpClient`], a transport layer that launches an MCP
//! server as a child process and drives it over its stdin/stdout with the
//! JSON-RPC line protocol defined in [`crate::rpc`].
//!
//! The client is strictly sequential: one request is in flight at a time and
//! the caller awaits its response before issuing the next. Server-originated
//! notifications or requests arriving while a response is pending are skipped.
//!
//! # Example
//!
//! ```no_run
//! use axprobe_core::client::McpClient;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = McpClient::spawn("npx", &["ios-simulator-mcp".into()])?;
//! client.initialize().await?;
//!
//! let tools = client.list_tools().await?;
//! println!("tools: {:?}", tools.iter().map(|t| &t.name).collect::<Vec<_>>());
//!
//! client.call_tool("ui_tap", json!({ "x": 100, "y": 100 })).await?;
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::process::Stdio;
use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use tracing::{debug, debug_span, trace, Instrument};

use crate::mcp::{
    CallToolResult, InitializeResult, ToolInfo, ToolsListResult, CLIENT_NAME, PROTOCOL_VERSION,
};
use crate::rpc::{self, RpcError, RpcNotification, RpcRequest};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout for reading the response to a single request.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period for the server process to exit after its stdin is closed.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// ServerStream trait
// ---------------------------------------------------------------------------

/// A bidirectional async stream suitable for MCP communication.
///
/// A spawned child's joined stdout/stdin satisfies these bounds, as does an
/// in-memory duplex pipe, allowing [`McpClient`] to be exercised against mock
/// servers in tests.
pub trait ServerStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ServerStream for T {}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while communicating with the server.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Attempted to send a request without an active connection.
    #[error("not connected to server")]
    NotConnected,

    /// The server process could not be started.
    #[error("failed to spawn server: {0}")]
    SpawnFailed(String),

    /// An I/O error occurred on the stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be encoded or decoded.
    #[error("wire error: {0}")]
    Rpc(#[from] RpcError),

    /// The server answered with a JSON-RPC error object.
    #[error("server error {code}: {message}")]
    ServerError { code: i64, message: String },

    /// The server completed the call but flagged the tool result as an error.
    #[error("tool call failed: {0}")]
    ToolFailed(String),

    /// The response parsed but did not have the expected result shape.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    /// The server closed its stdout before responding.
    #[error("server closed the connection")]
    Disconnected,

    /// A read operation exceeded its timeout.
    #[error("operation timed out")]
    Timeout,
}

// ---------------------------------------------------------------------------
// McpClient
// ---------------------------------------------------------------------------

/// Async client for an MCP server reached over stdio.
///
/// Owns the server child process (when created via [`spawn`](Self::spawn))
/// and the single connection for its entire lifetime. Dropping the client
/// kills the child.
pub struct McpClient {
    stream: Option<BufReader<Box<dyn ServerStream>>>,
    child: Option<Child>,
    next_id: u64,
}

impl McpClient {
    /// Launch the server command with piped stdin/stdout and connect to it.
    ///
    /// The child's stderr is inherited so server diagnostics remain visible.
    ///
    /// # Errors
    ///
    /// - [`ClientError::SpawnFailed`] if the process cannot be started or its
    ///   pipes cannot be captured
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, ClientError> {
        debug!(command, ?args, "spawning MCP server");

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::SpawnFailed(format!("{command}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("child stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::SpawnFailed("child stdout not captured".into()))?;

        let stream: Box<dyn ServerStream> = Box::new(tokio::io::join(stdout, stdin));
        Ok(Self {
            stream: Some(BufReader::new(stream)),
            child: Some(child),
            next_id: 1,
        })
    }

    /// Create a client from a pre-connected stream (e.g., an in-memory duplex
    /// pipe in tests). No child process is managed.
    pub fn from_stream(stream: impl ServerStream + 'static) -> Self {
        let stream: Box<dyn ServerStream> = Box::new(stream);
        Self {
            stream: Some(BufReader::new(stream)),
            child: None,
            next_id: 1,
        }
    }

    /// Returns `true` if the client currently holds an open connection.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    // -----------------------------------------------------------------------
    // MCP operations
    // -----------------------------------------------------------------------

    /// Perform the MCP handshake: send `initialize`, then the
    /// `notifications/initialized` notification.
    pub async fn initialize(&mut self) -> Result<InitializeResult, ClientError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        let result = self.request("initialize", params).await?;
        let init: InitializeResult = serde_json::from_value(result).map_err(RpcError::Json)?;

        self.notify("notifications/initialized", None).await?;

        debug!(
            protocol = %init.protocol_version,
            server = ?init.server_info,
            "initialized"
        );
        Ok(init)
    }

    /// Capability discovery: list the named operations the server supports.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, ClientError> {
        let result = self.request("tools/list", json!({})).await?;
        let parsed: ToolsListResult = serde_json::from_value(result).map_err(RpcError::Json)?;
        Ok(parsed.tools)
    }

    /// Invoke a named tool with the given arguments and wait for its result.
    ///
    /// A result flagged `isError: true` is converted into
    /// [`ClientError::ToolFailed`] so callers can treat all failures uniformly
    /// via the error type.
    pub async fn call_tool(
        &mut self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, ClientError> {
        let params = json!({ "name": name, "arguments": arguments });
        let result = self.request("tools/call", params).await?;
        let parsed: CallToolResult = serde_json::from_value(result).map_err(RpcError::Json)?;

        if parsed.failed() {
            let message = parsed.text().unwrap_or("tool reported an error").to_string();
            return Err(ClientError::ToolFailed(message));
        }
        Ok(parsed)
    }

    /// Close the connection and let the server process exit.
    ///
    /// Closing the stream drops the child's stdin, which is the stdio
    /// transport's shutdown signal. If the process does not exit within the
    /// grace period it is killed.
    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        self.stream.take();

        if let Some(mut child) = self.child.take() {
            match timeout(SHUTDOWN_TIMEOUT, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    debug!(?status, "server exited");
                }
                Err(_) => {
                    debug!("server did not exit in time, killing");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal request/response plumbing
    // -----------------------------------------------------------------------

    /// Send a request and wait for the response carrying its id.
    ///
    /// Inbound lines that are not that response (server notifications or
    /// requests, responses to stale ids) are skipped.
    async fn request(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let span = debug_span!("mcp_request", method);
        async {
            let id = self.next_id;
            self.next_id += 1;

            let line = rpc::encode_line(&RpcRequest::new(id, method, Some(params)))?;
            self.write_line(&line).await?;

            loop {
                let line = self.read_line().await?;
                if line.trim().is_empty() {
                    continue;
                }
                let msg = rpc::decode_line(&line)?;

                if !msg.is_response() || msg.id_u64() != Some(id) {
                    trace!(method = ?msg.method, "skipping non-matching message");
                    continue;
                }

                if let Some(err) = msg.error {
                    return Err(ClientError::ServerError {
                        code: err.code,
                        message: err.message,
                    });
                }
                return msg
                    .result
                    .ok_or_else(|| ClientError::UnexpectedResult("response missing result".into()));
            }
        }
        .instrument(span)
        .await
    }

    /// Send a notification; no response is expected.
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), ClientError> {
        let line = rpc::encode_line(&RpcNotification::new(method, params))?;
        self.write_line(&line).await
    }

    async fn write_line(&mut self, line: &str) -> Result<(), ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;
        trace!(bytes = line.len(), "writing line");
        stream.write_all(line.as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Read one line from the server, bounded by [`READ_TIMEOUT`].
    ///
    /// On EOF, I/O error, or timeout the stream is dropped so a later caller
    /// gets [`ClientError::NotConnected`] instead of reading a mismatched
    /// response left over from a previous request.
    async fn read_line(&mut self) -> Result<String, ClientError> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        let mut line = String::new();
        match timeout(READ_TIMEOUT, stream.read_line(&mut line)).await {
            Ok(Ok(0)) => {
                self.stream.take();
                Err(ClientError::Disconnected)
            }
            Ok(Ok(n)) => {
                trace!(bytes = n, "read line");
                Ok(line)
            }
            Ok(Err(io_err)) => {
                self.stream.take();
                Err(ClientError::Io(io_err))
            }
            Err(_) => {
                self.stream.take();
                Err(ClientError::Timeout)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
