//! Stdio bridge
//!
//! Implements `BridgeClient` on top of an `McpClient` spawned from the
//! configured command. One client is live at a time; `connect` replaces
//! whatever was there before.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::McpClient;
use crate::config::BridgeConfig;
use crate::core::{BridgeClient, InvocationResult, ServerInfo, ToolArguments, ToolDescriptor};
use crate::error::{Error, Result};

/// Bridge process driven over stdin/stdout
pub struct StdioBridge {
    config: BridgeConfig,
    client: Mutex<Option<Arc<McpClient>>>,
}

impl StdioBridge {
    /// Create a bridge for the given launch configuration; nothing is spawned yet
    pub fn new(config: BridgeConfig) -> Self {
        StdioBridge {
            config,
            client: Mutex::new(None),
        }
    }

    /// The launch configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn client(&self) -> Result<Arc<McpClient>> {
        self.client
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::Transport("Bridge is not connected".to_string()))
    }

    async fn take_client(&self) -> Option<Arc<McpClient>> {
        self.client.lock().await.take()
    }
}

#[async_trait]
impl BridgeClient for StdioBridge {
    async fn install(&self) -> Result<()> {
        let path = which::which(&self.config.command).map_err(|e| {
            Error::Install(format!("Bridge command '{}' not found: {}", self.config.command, e))
        })?;
        debug!("Resolved bridge command to {}", path.display());
        Ok(())
    }

    async fn connect(&self) -> Result<ServerInfo> {
        if let Some(previous) = self.take_client().await {
            previous.shutdown().await;
        }

        let (client, server_info) = McpClient::connect(&self.config).await?;
        info!(
            "Connected to {} {} (protocol {})",
            server_info.name, server_info.version, server_info.protocol_version
        );

        *self.client.lock().await = Some(Arc::new(client));
        Ok(server_info)
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        self.client().await?.list_tools().await
    }

    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<InvocationResult> {
        self.client().await?.call_tool(name, arguments).await
    }

    async fn disconnect(&self) {
        if let Some(client) = self.take_client().await {
            info!("Disconnecting from {}", client.name());
            client.shutdown().await;
        }
    }

    async fn uninstall(&self) {
        self.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing_command() -> BridgeConfig {
        BridgeConfig {
            command: "mcp-workbench-no-such-bridge".into(),
            args: vec![],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_install_missing_command() {
        let bridge = StdioBridge::new(missing_command());
        let err = bridge.install().await.unwrap_err();
        assert!(matches!(err, Error::Install(_)));
    }

    #[tokio::test]
    async fn test_requests_before_connect_fail() {
        let bridge = StdioBridge::new(missing_command());

        let err = bridge.list_tools().await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let err = bridge.call_tool("Anything", &ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        // No-ops without a live client
        bridge.disconnect().await;
        bridge.uninstall().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_then_disconnect() {
        let script = r#"
read init
echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","serverInfo":{"name":"script","version":"1"}}}'
read initialized
read list
echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[]}}'
sleep 30
"#;
        let bridge = StdioBridge::new(BridgeConfig {
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            request_timeout_secs: 5,
            ..Default::default()
        });

        tokio_test::assert_ok!(bridge.install().await);
        let info = bridge.connect().await.unwrap();
        assert_eq!(info.name, "script");
        assert!(bridge.list_tools().await.unwrap().is_empty());

        bridge.disconnect().await;
        assert!(bridge.list_tools().await.is_err());
    }
}
