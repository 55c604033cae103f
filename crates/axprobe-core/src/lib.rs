//! # axprobe-core
//!
//! Core library for probing MCP-based iOS Simulator automation servers.
//!
//! This crate provides the building blocks for the `axprobe` diagnostic tool:
//! a JSON-RPC stdio client for Model Context Protocol (MCP) servers, typed
//! payloads for the handful of remote tools the probe consumes, and the pure
//! post-processing routines applied to the returned UI descriptions.
//!
//! ## Modules
//!
//! - [`rpc`] - JSON-RPC 2.0 line protocol used by the MCP stdio transport
//! - [`mcp`] - Typed payloads for MCP handshake and tool-call envelopes
//! - [`client`] - Async client that spawns and drives an MCP server process
//! - [`extract`] - Recursive string extraction from JSON UI descriptions
//! - [`reference`] - Verse-reference pattern matching over extracted text
//! - [`config`] - Persistent probe configuration in `~/.axprobe/`
//!
//! ## External Dependencies
//!
//! The automation server itself is an external collaborator (for example
//! `ios-simulator-mcp` launched via `node` or `npx`). This crate only speaks
//! the stdio request/response contract; it never drives the simulator
//! directly.
//!
//! ## Example
//!
//! ```no_run
//! use axprobe_core::client::McpClient;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = McpClient::spawn("node", &["/path/to/server.js".into()])?;
//! client.initialize().await?;
//!
//! let tools = client.list_tools().await?;
//! println!("{} tools available", tools.len());
//!
//! let result = client.call_tool("ui_describe_all", json!({})).await?;
//! println!("{:?}", result.text());
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod extract;
pub mod mcp;
pub mod reference;
pub mod rpc;
