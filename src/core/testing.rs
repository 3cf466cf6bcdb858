//! In-memory bridge used by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use super::bridge::BridgeClient;
use super::types::{InvocationResult, ServerInfo, ToolArguments, ToolDescriptor};
use crate::error::{Error, Result};

/// Scriptable fake bridge that records every call it receives
#[derive(Default)]
pub struct FakeBridge {
    tools: Mutex<Vec<ToolDescriptor>>,
    list_error: Mutex<Option<String>>,
    install_error: Mutex<Option<String>>,
    connect_error: Mutex<Option<Error>>,
    responses: Mutex<HashMap<String, std::result::Result<InvocationResult, String>>>,
    held: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<(String, ToolArguments)>>,
    disconnects: Mutex<usize>,
    disconnect_delay: Mutex<Option<Duration>>,
    lifecycle: Mutex<Vec<&'static str>>,
}

impl FakeBridge {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeBridge::default())
    }

    pub fn set_tools(&self, tools: Vec<ToolDescriptor>) {
        *self.tools.lock().unwrap() = tools;
    }

    pub fn fail_list(&self, message: Option<&str>) {
        *self.list_error.lock().unwrap() = message.map(str::to_string);
    }

    pub fn fail_install(&self, message: &str) {
        *self.install_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_connect(&self, error: Error) {
        *self.connect_error.lock().unwrap() = Some(error);
    }

    pub fn respond(&self, tool: &str, text: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(tool.to_string(), Ok(InvocationResult::success(text)));
    }

    pub fn respond_with(&self, tool: &str, result: InvocationResult) {
        self.responses.lock().unwrap().insert(tool.to_string(), Ok(result));
    }

    pub fn fail_call(&self, tool: &str, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(tool.to_string(), Err(message.to_string()));
    }

    /// Calls to `tool` block until the returned notify is signalled
    pub fn hold(&self, tool: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held
            .lock()
            .unwrap()
            .insert(tool.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn calls(&self) -> Vec<(String, ToolArguments)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, tool: &str) -> Vec<ToolArguments> {
        self.calls()
            .into_iter()
            .filter(|(name, _)| name == tool)
            .map(|(_, args)| args)
            .collect()
    }

    pub fn disconnect_count(&self) -> usize {
        *self.disconnects.lock().unwrap()
    }

    /// Disconnects take `delay` before they are recorded
    pub fn slow_disconnect(&self, delay: Duration) {
        *self.disconnect_delay.lock().unwrap() = Some(delay);
    }

    /// Lifecycle calls in the order they ran; disconnects are logged on completion
    pub fn lifecycle_log(&self) -> Vec<&'static str> {
        self.lifecycle.lock().unwrap().clone()
    }

    fn log(&self, call: &'static str) {
        self.lifecycle.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BridgeClient for FakeBridge {
    async fn install(&self) -> Result<()> {
        self.log("install");
        match self.install_error.lock().unwrap().clone() {
            Some(message) => Err(Error::Install(message)),
            None => Ok(()),
        }
    }

    async fn connect(&self) -> Result<ServerInfo> {
        self.log("connect");
        if let Some(err) = self.connect_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(ServerInfo {
            name: "fake-bridge".to_string(),
            version: "1.0.0".to_string(),
            protocol_version: "2024-11-05".to_string(),
        })
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>> {
        if let Some(message) = self.list_error.lock().unwrap().clone() {
            return Err(Error::Transport(message));
        }
        Ok(self.tools.lock().unwrap().clone())
    }

    async fn call_tool(&self, name: &str, arguments: &ToolArguments) -> Result<InvocationResult> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));

        let gate = self.held.lock().unwrap().get(name).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.responses.lock().unwrap().get(name).cloned() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(Error::Transport(message)),
            None => Err(Error::NotFound(format!("no scripted response for {}", name))),
        }
    }

    async fn disconnect(&self) {
        let delay = *self.disconnect_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        *self.disconnects.lock().unwrap() += 1;
        self.log("disconnect");
    }

    async fn uninstall(&self) {
        self.log("uninstall");
    }
}
