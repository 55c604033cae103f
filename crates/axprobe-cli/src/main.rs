//! CLI diagnostic probe for MCP iOS Simulator automation servers.
//!
//! Launches an MCP server over stdio, runs a fixed sequence of remote tool
//! calls, and post-processes the returned JSON to verify a simulator is
//! reachable and rendering expected content.
//!
//! # Usage
//!
//! ```bash
//! # Full probe: list tools, query the booted simulator, capture a
//! # screenshot, dump the UI tree, tap, type
//! axprobe --server-cmd node --server-arg /opt/ios-simulator-mcp/build/index.js probe
//!
//! # Probe with custom tap coordinates and typed text
//! axprobe probe --tap-x 200 --tap-y 400 --text "hi"
//!
//! # Check the current UI for a verse-like reference (e.g. "John 3:16")
//! axprobe check-reference
//!
//! # Just list the server's tools
//! axprobe tools
//! axprobe --format json tools
//!
//! # Artifacts go to ./artifacts/ios by default
//! axprobe --artifacts /tmp/probe-artifacts probe
//! ```
//!
//! The server command falls back to `~/.axprobe/config.json` when the
//! `--server-cmd` flag and `AXPROBE_SERVER_CMD` env var are absent.
//!
//! # Exit codes
//!
//! - 0: success (flow completed / reference found)
//! - 1: uncaught error (spawn, handshake, remote call failure)
//! - 2: a required tool is missing from the server's tool list
//! - 3: a tool's text payload was not parseable as JSON
//! - 4: no matching reference text found

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use axprobe_core::client::McpClient;
use axprobe_core::config::ProbeConfig;
use axprobe_core::extract::extract_strings;
use axprobe_core::mcp::CallToolResult;
use axprobe_core::reference::find_reference;

const SCREENSHOT_FILENAME: &str = "sim_screenshot.png";
const UI_DUMP_FILENAME: &str = "ui_describe_all.json";

/// CLI diagnostic probe for MCP iOS Simulator automation servers.
#[derive(Parser)]
#[command(name = "axprobe")]
#[command(about = "Probe an MCP iOS Simulator automation server over stdio")]
#[command(version)]
struct Cli {
    /// Command used to launch the MCP server
    #[arg(long, env = "AXPROBE_SERVER_CMD")]
    server_cmd: Option<String>,

    /// Argument passed to the server command (repeatable)
    #[arg(long = "server-arg", value_name = "ARG")]
    server_args: Vec<String>,

    /// Directory for probe artifacts (screenshot, UI dump)
    #[arg(long, env = "AXPROBE_ARTIFACTS")]
    artifacts: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full diagnostic sequence against the simulator
    Probe {
        /// X coordinate for the diagnostic tap
        #[arg(long, default_value = "100")]
        tap_x: i64,
        /// Y coordinate for the diagnostic tap
        #[arg(long, default_value = "100")]
        tap_y: i64,
        /// Text typed into the focused field
        #[arg(long, default_value = "Hello")]
        text: String,
    },

    /// Scan the current UI for a verse-like reference (e.g. "John 3:16")
    CheckReference,

    /// List the tools the server exposes
    Tools,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    /// Spawn, handshake, or remote call failure. Exit 1.
    Failure(String),
    /// A required tool is absent from the discovered tool list. Exit 2.
    MissingTool(String),
    /// A tool's text payload was not valid JSON. Exit 3.
    Malformed(String),
    /// No verse-like reference found in the current UI. Exit 4.
    NotFound,
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Failure(_) => ExitCode::from(1),
            CliError::MissingTool(_) => ExitCode::from(2),
            CliError::Malformed(_) => ExitCode::from(3),
            CliError::NotFound => ExitCode::from(4),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Failure(msg) => write!(f, "{}", msg),
            CliError::MissingTool(name) => write!(f, "{} tool not available", name),
            CliError::Malformed(msg) => write!(f, "{}", msg),
            CliError::NotFound => write!(f, "no verse-like reference found in current UI"),
        }
    }
}

/// Resolve the server command line: CLI flags/env first, then the config file.
fn resolve_server(cli: &Cli, config: &ProbeConfig) -> Result<(String, Vec<String>), CliError> {
    if let Some(cmd) = &cli.server_cmd {
        return Ok((cmd.clone(), cli.server_args.clone()));
    }
    if let Some(cmd) = &config.server_command {
        return Ok((cmd.clone(), config.server_args.clone()));
    }
    Err(CliError::Failure(
        "no server command configured; pass --server-cmd or set server_command in ~/.axprobe/config.json"
            .to_string(),
    ))
}

/// Resolve the artifact directory: CLI flag/env first, then the config file,
/// then `artifacts/ios` relative to the working directory.
fn resolve_artifacts(cli: &Cli, config: &ProbeConfig) -> PathBuf {
    cli.artifacts
        .clone()
        .or_else(|| config.artifact_dir.clone())
        .unwrap_or_else(|| PathBuf::from("artifacts/ios"))
}

/// Make a path absolute against the current working directory. The screenshot
/// path is handed to the server process, which may have a different notion of
/// a relative path than we do.
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = ProbeConfig::load();
    let (command, args) = resolve_server(&cli, &config)?;
    debug!(%command, ?args, "resolved server command");

    let mut client = McpClient::spawn(&command, &args)
        .map_err(|e| CliError::Failure(format!("failed to start server: {}", e)))?;
    client
        .initialize()
        .await
        .map_err(|e| CliError::Failure(format!("handshake failed: {}", e)))?;

    let result = match cli.command {
        Command::Probe { tap_x, tap_y, ref text } => {
            let text = text.clone();
            run_probe(&mut client, &cli, &config, tap_x, tap_y, &text).await
        }
        Command::CheckReference => run_check_reference(&mut client, &cli).await,
        Command::Tools => run_tools(&mut client, &cli).await,
    };

    if result.is_ok() {
        client
            .shutdown()
            .await
            .map_err(|e| CliError::Failure(format!("shutdown failed: {}", e)))?;
    }
    result
}

/// Discover the server's tool names.
async fn discover_tools(client: &mut McpClient) -> Result<Vec<String>, CliError> {
    let tools = client
        .list_tools()
        .await
        .map_err(|e| CliError::Failure(format!("tool discovery failed: {}", e)))?;
    Ok(tools.into_iter().map(|t| t.name).collect())
}

/// Verify a tool was discovered before attempting to call it.
fn require_tool(names: &HashSet<String>, name: &str) -> Result<(), CliError> {
    if names.contains(name) {
        Ok(())
    } else {
        Err(CliError::MissingTool(name.to_string()))
    }
}

/// Call a tool, timing it and emitting a stderr progress line unless quiet.
async fn call(
    client: &mut McpClient,
    name: &str,
    args: serde_json::Value,
    quiet: bool,
) -> Result<CallToolResult, CliError> {
    let start = Instant::now();
    let result = client
        .call_tool(name, args)
        .await
        .map_err(|e| CliError::Failure(format!("{} failed: {}", name, e)))?;
    if !quiet {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3fZ");
        eprintln!("|{}|{}|{}ms|", now, name, start.elapsed().as_millis());
    }
    Ok(result)
}

fn pretty(result: &CallToolResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

/// The full diagnostic sequence: list tools, query the booted simulator,
/// capture a screenshot, dump the UI tree, tap, type. Each required tool is
/// checked against the discovered set immediately before its call.
async fn run_probe(
    client: &mut McpClient,
    cli: &Cli,
    config: &ProbeConfig,
    tap_x: i64,
    tap_y: i64,
    text: &str,
) -> Result<(), CliError> {
    let names = discover_tools(client).await?;
    println!("TOOLS: {}", names.join(", "));
    let names: HashSet<String> = names.into_iter().collect();

    require_tool(&names, "get_booted_sim_id")?;
    let result = call(client, "get_booted_sim_id", json!({}), cli.quiet).await?;
    println!("CALL_RESULT: {}", pretty(&result));

    let artifact_dir = absolute(&resolve_artifacts(cli, config));
    std::fs::create_dir_all(&artifact_dir)
        .map_err(|e| CliError::Failure(format!("failed to create artifact dir: {}", e)))?;

    require_tool(&names, "screenshot")?;
    let shot_path = artifact_dir.join(SCREENSHOT_FILENAME);
    let shot = call(
        client,
        "screenshot",
        json!({ "output_path": shot_path.to_string_lossy() }),
        cli.quiet,
    )
    .await?;
    println!("SCREENSHOT: {}", pretty(&shot));
    println!("Saved screenshot to {}", shot_path.display());

    require_tool(&names, "ui_describe_all")?;
    let desc = call(client, "ui_describe_all", json!({}), cli.quiet).await?;
    let payload = desc.text().unwrap_or("");
    // Validate before writing: a malformed payload must not leave an artifact.
    serde_json::from_str::<serde_json::Value>(payload)
        .map_err(|_| CliError::Malformed("failed to parse UI JSON".to_string()))?;
    let ui_path = artifact_dir.join(UI_DUMP_FILENAME);
    std::fs::write(&ui_path, payload)
        .map_err(|e| CliError::Failure(format!("failed to write UI description: {}", e)))?;
    println!("Saved UI description to {}", ui_path.display());

    require_tool(&names, "ui_tap")?;
    let tap = call(client, "ui_tap", json!({ "x": tap_x, "y": tap_y }), cli.quiet).await?;
    println!("TAP_RESULT: {}", pretty(&tap));

    require_tool(&names, "ui_type")?;
    let typed = call(client, "ui_type", json!({ "text": text }), cli.quiet).await?;
    println!("TYPE_RESULT: {}", pretty(&typed));

    Ok(())
}

/// Dump the UI tree, flatten it to strings, and look for a verse reference.
async fn run_check_reference(client: &mut McpClient, cli: &Cli) -> Result<(), CliError> {
    let names: HashSet<String> = discover_tools(client).await?.into_iter().collect();
    require_tool(&names, "ui_describe_all")?;

    let desc = call(client, "ui_describe_all", json!({}), cli.quiet).await?;
    let payload = desc.text().unwrap_or("");
    let parsed: serde_json::Value = serde_json::from_str(payload)
        .map_err(|_| CliError::Malformed("failed to parse UI JSON".to_string()))?;

    let texts = extract_strings(&parsed);
    match find_reference(&texts) {
        Some(hit) => {
            if cli.format == OutputFormat::Json {
                println!("{}", json!({ "found": hit }));
            } else {
                println!("FOUND_REFERENCE: {}", hit);
            }
            Ok(())
        }
        None => Err(CliError::NotFound),
    }
}

/// List the server's tools.
async fn run_tools(client: &mut McpClient, cli: &Cli) -> Result<(), CliError> {
    let names = discover_tools(client).await?;
    if cli.format == OutputFormat::Json {
        println!("{}", json!({ "tools": names }));
    } else {
        if names.is_empty() {
            eprintln!("No tools reported by server");
        } else {
            for name in names {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli(server_cmd: Option<&str>) -> Cli {
        Cli {
            server_cmd: server_cmd.map(String::from),
            server_args: vec![],
            artifacts: None,
            format: OutputFormat::Text,
            quiet: true,
            command: Command::Tools,
        }
    }

    #[test]
    fn resolve_server_prefers_cli_flag() {
        let mut cli = base_cli(Some("node"));
        cli.server_args = vec!["server.js".to_string()];
        let config = ProbeConfig {
            server_command: Some("npx".to_string()),
            server_args: vec!["ios-simulator-mcp".to_string()],
            artifact_dir: None,
        };
        let (cmd, args) = resolve_server(&cli, &config).unwrap();
        assert_eq!(cmd, "node");
        assert_eq!(args, vec!["server.js"]);
    }

    #[test]
    fn resolve_server_falls_back_to_config() {
        let cli = base_cli(None);
        let config = ProbeConfig {
            server_command: Some("npx".to_string()),
            server_args: vec!["ios-simulator-mcp".to_string()],
            artifact_dir: None,
        };
        let (cmd, args) = resolve_server(&cli, &config).unwrap();
        assert_eq!(cmd, "npx");
        assert_eq!(args, vec!["ios-simulator-mcp"]);
    }

    #[test]
    fn resolve_server_errors_when_unconfigured() {
        let cli = base_cli(None);
        let result = resolve_server(&cli, &ProbeConfig::default());
        assert!(matches!(result, Err(CliError::Failure(_))));
    }

    #[test]
    fn resolve_artifacts_default() {
        let cli = base_cli(None);
        let dir = resolve_artifacts(&cli, &ProbeConfig::default());
        assert_eq!(dir, PathBuf::from("artifacts/ios"));
    }

    #[test]
    fn require_tool_reports_the_missing_name() {
        let names: HashSet<String> = ["ui_tap".to_string()].into_iter().collect();
        assert!(require_tool(&names, "ui_tap").is_ok());
        match require_tool(&names, "ui_describe_all") {
            Err(CliError::MissingTool(name)) => assert_eq!(name, "ui_describe_all"),
            other => panic!("expected MissingTool, got: {other:?}"),
        }
    }

    #[test]
    fn absolute_leaves_absolute_paths_alone() {
        let path = PathBuf::from("/tmp/artifacts");
        assert_eq!(absolute(&path), path);
    }
}
