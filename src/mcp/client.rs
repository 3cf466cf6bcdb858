//! MCP client for connecting to MCP servers
//!
//! Supports stdio transport (spawning a subprocess). Requests are
//! line-delimited JSON-RPC and are serialized one round trip at a time.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::protocol::{InitializeResult, ListToolsResult, McpNotification, McpRequest, McpResponse};
use crate::config::BridgeConfig;
use crate::core::{InvocationResult, ServerInfo, ToolArguments, ToolDescriptor};
use crate::error::{Error, Result};

/// Child stdin/stdout, locked together for a full request/response
struct Pipes {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// MCP client for communicating with an MCP server
pub struct McpClient {
    child: Mutex<Child>,
    pipes: Mutex<Pipes>,
    next_id: AtomicU64,
    timeout: Option<Duration>,
    name: String,
}

impl McpClient {
    /// Spawn the configured bridge and perform the initialize handshake
    ///
    /// A missing executable is an install error; anything that goes wrong
    /// after the process starts is a connect error.
    pub async fn connect(config: &BridgeConfig) -> Result<(Self, ServerInfo)> {
        debug!("Connecting to MCP server: {} {:?}", config.command, config.args);

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Install(
                    format!("Failed to spawn MCP server '{}': {}", config.command, e),
                ),
                _ => Error::Connect(format!(
                    "Failed to spawn MCP server '{}': {}",
                    config.command, e
                )),
            })?;

        let stdin = child.stdin.take()
            .ok_or_else(|| Error::Connect("Failed to capture MCP server stdin".to_string()))?;
        let stdout = child.stdout.take()
            .ok_or_else(|| Error::Connect("Failed to capture MCP server stdout".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            let name = config.command.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("MCP stderr [{}]: {}", name, line);
                }
            });
        }

        let client = McpClient {
            child: Mutex::new(child),
            pipes: Mutex::new(Pipes {
                stdin,
                stdout: BufReader::new(stdout),
            }),
            next_id: AtomicU64::new(1),
            timeout: config.request_timeout(),
            name: config.command.clone(),
        };

        let info = client
            .initialize()
            .await
            .map_err(|e| Error::Connect(format!("MCP handshake with {} failed: {}", client.name, e)))?;

        Ok((client, info))
    }

    /// Initialize the MCP connection
    async fn initialize(&self) -> Result<ServerInfo> {
        let result: InitializeResult = self.request(McpRequest::initialize(self.next_id())).await?;
        debug!("MCP server {} initialized: {:?}", self.name, result);

        {
            let mut pipes = self.pipes.lock().await;
            write_line(&mut pipes.stdin, &McpNotification::initialized()).await?;
        }

        Ok(result.into())
    }

    /// List available tools from the MCP server
    pub async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        let result: ListToolsResult = self.request(McpRequest::list_tools(self.next_id())).await?;
        debug!("MCP server {} has {} tools", self.name, result.tools.len());
        Ok(result.tools)
    }

    /// Call a tool on the MCP server
    pub async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<InvocationResult> {
        let request = McpRequest::call_tool(self.next_id(), name, arguments);
        let result: InvocationResult = self.request(request).await?;

        if result.is_error {
            warn!("MCP tool {} returned error", name);
        }

        Ok(result)
    }

    /// Kill the server process
    pub async fn shutdown(&self) {
        let mut child = self.child.lock().await;
        if let Err(e) = child.kill().await {
            debug!("Failed to kill MCP server {}: {}", self.name, e);
        }
    }

    /// Get the server name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and decode its result, honouring the request timeout
    async fn request<T: DeserializeOwned>(&self, request: McpRequest) -> Result<T> {
        let method = request.method.clone();
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send_request(request))
                .await
                .map_err(|_| Error::Timeout(format!("{} after {:?}", method, limit)))??,
            None => self.send_request(request).await?,
        };

        let result = response.result.unwrap_or_default();
        serde_json::from_value(result)
            .map_err(|e| Error::Transport(format!("Failed to parse {} result: {}", method, e)))
    }

    /// Send a request and read lines until its response arrives
    async fn send_request(&self, request: McpRequest) -> Result<McpResponse> {
        let mut pipes = self.pipes.lock().await;

        debug!("MCP request -> {}: {} #{}", self.name, request.method, request.id);
        write_line(&mut pipes.stdin, &request).await?;

        let mut line = String::new();
        loop {
            line.clear();
            let read = pipes.stdout.read_line(&mut line).await
                .map_err(|e| Error::Transport(format!("Failed to read from MCP server: {}", e)))?;
            if read == 0 {
                return Err(Error::Transport(format!("MCP server {} closed its output", self.name)));
            }

            let raw = line.trim();
            if raw.is_empty() {
                continue;
            }

            let response: McpResponse = match serde_json::from_str(raw) {
                Ok(response) => response,
                Err(e) => {
                    debug!("Skipping unparseable MCP line ({}): {}", e, raw);
                    continue;
                }
            };

            // Notifications and responses to requests that already timed out
            if response.id != Some(request.id) {
                debug!("Skipping MCP message {:?} while waiting for #{}", response.id, request.id);
                continue;
            }

            debug!("MCP response <- {}: #{}", self.name, request.id);

            if let Some(ref err) = response.error {
                return Err(Error::Transport(format!(
                    "MCP error from {}: {} (code {})",
                    self.name, err.message, err.code
                )));
            }

            return Ok(response);
        }
    }
}

async fn write_line<T: Serialize>(stdin: &mut ChildStdin, message: &T) -> Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    stdin.write_all(json.as_bytes()).await
        .map_err(|e| Error::Transport(format!("Failed to write to MCP server: {}", e)))?;
    stdin.flush().await
        .map_err(|e| Error::Transport(format!("Failed to flush MCP server stdin: {}", e)))?;
    Ok(())
}

impl Drop for McpClient {
    fn drop(&mut self) {
        // kill_on_drop takes care of the process
        debug!("Dropping MCP client for {}", self.name);
    }
}
