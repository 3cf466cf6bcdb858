//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<Config> {
    let extension = path.extension().and_then(|ext| ext.to_str());

    let config: Config = match extension {
        // JSON5 is a superset of JSON and tolerates comments
        Some("json") => json5::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => match json5::from_str(content) {
            Ok(config) => config,
            Err(_) => toml::from_str(content)?,
        },
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` if present, then overlays any set variables. Env vars have
/// the highest precedence.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();

    if let Ok(command) = std::env::var("MCP_WORKBENCH_BRIDGE_COMMAND") {
        config.bridge.command = command;
    }
    if let Ok(args) = std::env::var("MCP_WORKBENCH_BRIDGE_ARGS") {
        config.bridge.args = args.split_whitespace().map(str::to_string).collect();
    }
    if let Ok(timeout) = std::env::var("MCP_WORKBENCH_REQUEST_TIMEOUT") {
        if let Ok(v) = timeout.parse() {
            config.bridge.request_timeout_secs = v;
        }
    }

    if let Ok(tool) = std::env::var("MCP_WORKBENCH_DISCOVERY_TOOL") {
        config.discovery.tool = tool;
    }
    if let Ok(parameter) = std::env::var("MCP_WORKBENCH_CONTEXT_PARAMETER") {
        config.discovery.context_parameter = parameter;
    }

    if let Ok(level) = std::env::var("MCP_WORKBENCH_LOG") {
        config.logging.level = level;
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
