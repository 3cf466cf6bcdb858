//! MCP wire protocol types
//!
//! Based on the Model Context Protocol specification (JSON-RPC 2.0).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{ServerInfo, ToolArguments, ToolDescriptor};

/// Protocol revision requested during the handshake
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC request to an MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl McpRequest {
    /// Create a new MCP request
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    /// Create an initialize request
    pub fn initialize(id: u64) -> Self {
        Self::new(id, "initialize", Some(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": crate::NAME,
                "version": crate::VERSION
            }
        })))
    }

    /// Create a tools/list request
    pub fn list_tools(id: u64) -> Self {
        Self::new(id, "tools/list", None)
    }

    /// Create a tools/call request with string arguments
    pub fn call_tool(id: u64, name: impl Into<String>, arguments: &ToolArguments) -> Self {
        Self::new(id, "tools/call", Some(serde_json::json!({
            "name": name.into(),
            "arguments": arguments
        })))
    }
}

/// JSON-RPC notification (no id, no response)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpNotification {
    pub jsonrpc: String,
    pub method: String,
}

impl McpNotification {
    /// Sent once the initialize response has been received
    pub fn initialized() -> Self {
        McpNotification {
            jsonrpc: "2.0".to_string(),
            method: "notifications/initialized".to_string(),
        }
    }
}

/// JSON-RPC response from an MCP server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Result of the initialize handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(rename = "serverInfo")]
    pub server_info: Implementation,
}

/// Name and version of an MCP peer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Implementation {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl From<InitializeResult> for ServerInfo {
    fn from(result: InitializeResult) -> Self {
        ServerInfo {
            name: result.server_info.name,
            version: result.server_info.version,
            protocol_version: result.protocol_version,
        }
    }
}

/// Result of a tools/list response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}
