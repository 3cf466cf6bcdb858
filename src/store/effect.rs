//! Effects scheduled by the reducers
//!
//! Reducers never touch the bridge. They return effects, and the runtime
//! executes them, reporting back with exactly one follow-up action (or none,
//! for fire-and-forget disconnect and uninstall). Lifecycle effects are
//! executed strictly in order; request effects run concurrently.

use crate::core::ToolArguments;

use super::session::SessionId;

/// Asynchronous work requested by a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Make sure the bridge binary is installed
    Install,
    /// Handshake with the bridge
    Connect,
    /// Drop the bridge connection
    Disconnect,
    /// Tear down the local bridge installation
    Uninstall,
    /// Fetch the tool catalog
    ListTools {
        /// Connection epoch the request belongs to
        epoch: u64,
    },
    /// Invoke the discovery tool and parse its output into contexts
    DiscoverContexts {
        epoch: u64,
        tool: String,
    },
    /// Invoke a tool on behalf of an invocation session
    CallTool {
        session: SessionId,
        epoch: u64,
        tool: String,
        arguments: ToolArguments,
    },
}

impl Effect {
    /// Install, connect, disconnect and uninstall
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Effect::Install | Effect::Connect | Effect::Disconnect | Effect::Uninstall
        )
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Install => "install",
            Effect::Connect => "connect",
            Effect::Disconnect => "disconnect",
            Effect::Uninstall => "uninstall",
            Effect::ListTools { .. } => "list_tools",
            Effect::DiscoverContexts { .. } => "discover_contexts",
            Effect::CallTool { .. } => "call_tool",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_classification() {
        assert!(Effect::Connect.is_lifecycle());
        assert!(Effect::Disconnect.is_lifecycle());
        assert!(!Effect::ListTools { epoch: 1 }.is_lifecycle());
        assert!(!Effect::DiscoverContexts {
            epoch: 1,
            tool: "XcodeListWindows".into()
        }
        .is_lifecycle());
    }
}
