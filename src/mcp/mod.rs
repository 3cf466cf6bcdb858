//! MCP (Model Context Protocol) module
//!
//! Talks to the bridge process that exposes the IDE's tools over MCP.
//!
//! ## Architecture
//!
//! - **client**: MCP client over a spawned subprocess
//! - **protocol**: Wire protocol types (JSON-RPC based)
//! - **bridge**: `StdioBridge`, the `BridgeClient` the store drives
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mcp_workbench::config::BridgeConfig;
//! use mcp_workbench::core::{BridgeClient, ToolArguments};
//! use mcp_workbench::mcp::StdioBridge;
//!
//! # async fn example() -> mcp_workbench::Result<()> {
//! let bridge = StdioBridge::new(BridgeConfig::default());
//! bridge.install().await?;
//! let server = bridge.connect().await?;
//! println!("connected to {}", server.name);
//!
//! let tools = bridge.list_tools().await?;
//! let result = bridge.call_tool(&tools[0].name, &ToolArguments::new()).await?;
//! println!("{:?}", result.result_text());
//! # Ok(())
//! # }
//! ```

mod bridge;
mod client;
mod protocol;

pub use bridge::StdioBridge;
pub use client::McpClient;
pub use protocol::{
    Implementation, InitializeResult, ListToolsResult, McpError, McpNotification, McpRequest,
    McpResponse, PROTOCOL_VERSION,
};
