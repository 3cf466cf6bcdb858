//! Execution context discovery configuration

use serde::{Deserialize, Serialize};

/// Which tool lists execution contexts and how its output is read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Tool invoked with no arguments to list contexts
    #[serde(default = "default_tool")]
    pub tool: String,
    /// Session parameter that receives a context id
    #[serde(default = "default_context_parameter")]
    pub context_parameter: String,
    /// Field names holding the context id, first match wins
    #[serde(default = "default_id_fields")]
    pub id_fields: Vec<String>,
    /// Field names holding the location path, first match wins
    #[serde(default = "default_path_fields")]
    pub path_fields: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            tool: default_tool(),
            context_parameter: default_context_parameter(),
            id_fields: default_id_fields(),
            path_fields: default_path_fields(),
        }
    }
}

fn default_tool() -> String {
    "XcodeListWindows".to_string()
}

fn default_context_parameter() -> String {
    "tabIdentifier".to_string()
}

fn default_id_fields() -> Vec<String> {
    vec!["tabIdentifier".to_string(), "contextId".to_string()]
}

fn default_path_fields() -> Vec<String> {
    vec!["workspacePath".to_string(), "locationPath".to_string()]
}
