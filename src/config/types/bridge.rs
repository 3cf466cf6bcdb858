//! Bridge process configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// How to launch and talk to the bridge process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Executable to spawn
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Per-request timeout, 0 disables it
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Extra environment for the bridge process
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            command: default_command(),
            args: default_args(),
            request_timeout_secs: default_timeout(),
            env: HashMap::new(),
        }
    }
}

impl BridgeConfig {
    /// Request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_command() -> String {
    "xcrun".to_string()
}

fn default_args() -> Vec<String> {
    vec!["mcpbridge".to_string()]
}

fn default_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_timeout() {
        let mut config = BridgeConfig::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(60)));

        config.request_timeout_secs = 0;
        assert_eq!(config.request_timeout(), None);
    }
}
