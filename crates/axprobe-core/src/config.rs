//! Persistent configuration for axprobe.
//!
//! Stores user settings in `~/.axprobe/config.json`: the command line used to
//! launch the MCP automation server and the directory where probe artifacts
//! (screenshots, UI dumps) are written. CLI flags override the file.
//!
//! # Example
//!
//! ```no_run
//! use axprobe_core::config::ProbeConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = ProbeConfig::load();
//!
//! if let Some(cmd) = &config.server_command {
//!     println!("Server: {} {}", cmd, config.server_args.join(" "));
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_FILENAME: &str = "config.json";

/// Returns the axprobe directory path (`~/.axprobe/`).
///
/// Creates the directory if it doesn't exist.
///
/// # Panics
///
/// Panics if the home directory cannot be determined.
pub fn axprobe_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .expect("Could not determine home directory")
        .join(".axprobe");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Persistent axprobe configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProbeConfig {
    /// Command used to launch the MCP automation server (e.g. `node`, `npx`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_command: Option<String>,

    /// Arguments passed to the server command (e.g. the server script path).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_args: Vec<String>,

    /// Directory where probe artifacts are written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,
}

impl ProbeConfig {
    /// Load config from `~/.axprobe/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        let path = axprobe_dir().join(CONFIG_FILENAME);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.axprobe/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        let path = axprobe_dir().join(CONFIG_FILENAME);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_empty() {
        let config = ProbeConfig::default();
        assert!(config.server_command.is_none());
        assert!(config.server_args.is_empty());
        assert!(config.artifact_dir.is_none());
    }

    #[test]
    fn roundtrip_serialization() {
        let config = ProbeConfig {
            server_command: Some("node".to_string()),
            server_args: vec!["/opt/ios-simulator-mcp/build/index.js".to_string()],
            artifact_dir: Some(PathBuf::from("artifacts/ios")),
        };
        let json = serde_json::to_string(&config).unwrap();
        let loaded: ProbeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.server_command, config.server_command);
        assert_eq!(loaded.server_args, config.server_args);
        assert_eq!(loaded.artifact_dir, config.artifact_dir);
    }

    #[test]
    fn deserialize_empty_json() {
        let loaded: ProbeConfig = serde_json::from_str("{}").unwrap();
        assert!(loaded.server_command.is_none());
        assert!(loaded.server_args.is_empty());
    }

    #[test]
    fn load_returns_default_for_missing_file() {
        // ProbeConfig::load() should not panic even if file doesn't exist.
        let config = ProbeConfig::load();
        let _ = config;
    }
}
