//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MCP_WORKBENCH_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("mcp-workbench"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("mcp-workbench"))
                .unwrap_or_else(|| PathBuf::from(".mcp-workbench"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("MCP_WORKBENCH_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}
