//! Bridge trait - Abstract interface for the remote tool host
//!
//! The state tree never talks to a transport directly. Effects produced by
//! the reducers are executed against a `BridgeClient`, which is implemented
//! by the stdio MCP transport in production and by in-memory fakes in tests.

use async_trait::async_trait;

use super::types::{InvocationResult, ServerInfo, ToolArguments, ToolDescriptor};
use crate::error::Result;

/// Capability consumed by the runtime to reach the bridge
///
/// Lifecycle calls fail with `Error::Install` or `Error::Connect`; request
/// calls fail with `Error::Transport` (or `Error::Timeout`).
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Make sure the bridge binary is available locally
    async fn install(&self) -> Result<()> {
        Ok(())
    }

    /// Perform the handshake and report the server identity
    async fn connect(&self) -> Result<ServerInfo>;

    /// List the tools exposed by the bridge
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>>;

    /// Invoke a tool with string arguments
    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<InvocationResult>;

    /// Drop the connection. Fire-and-forget.
    async fn disconnect(&self);

    /// Tear down local resources. Fire-and-forget.
    async fn uninstall(&self);
}
