//! Store runtime
//!
//! A single task owns the `AppState` and applies one action at a time from an
//! unbounded queue. Request effects run as independent tasks against the
//! `BridgeClient`. Lifecycle effects (install, connect, disconnect,
//! uninstall) run one after another on a dedicated task, in the order the
//! reducer emitted them. Either way, each reports back by enqueueing at most
//! one follow-up action, never by touching state. Snapshots are published on
//! a watch channel after every action.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::DiscoveryConfig;
use crate::core::{BridgeClient, ToolArguments};
use crate::error::{Error, Result};

use super::app::{AppAction, AppState, Intent};
use super::catalog::CatalogAction;
use super::connection::ConnectionAction;
use super::contexts::{ContextAction, ContextParser};
use super::effect::Effect;
use super::session::SessionAction;

/// Handle to a running store
pub struct Store {
    actions: mpsc::UnboundedSender<AppAction>,
    state: watch::Receiver<AppState>,
    task: JoinHandle<()>,
}

impl Store {
    /// Start the apply loop. Must be called within a tokio runtime.
    pub fn spawn(bridge: Arc<dyn BridgeClient>, discovery: DiscoveryConfig) -> Self {
        let (actions, queue) = mpsc::unbounded_channel();
        let parser = Arc::new(ContextParser::from_config(&discovery));
        let initial = AppState::new(discovery);
        let (publisher, state) = watch::channel(initial.clone());

        let executor = EffectExecutor {
            bridge,
            parser,
            actions: actions.downgrade(),
        };
        let (lifecycle, lifecycle_queue) = mpsc::unbounded_channel();
        tokio::spawn(lifecycle_loop(lifecycle_queue, executor.clone()));

        let runner = EffectRunner { executor, lifecycle };
        let task = tokio::spawn(apply_loop(initial, queue, publisher, runner));

        Store { actions, state, task }
    }

    /// Send a user intent into the queue
    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        debug!("Intent: {:?}", intent);
        self.actions
            .send(intent.into())
            .map_err(|_| Error::Internal("store is no longer running".to_string()))
    }

    /// Latest published snapshot
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.clone()
    }

    /// Wait until a snapshot satisfies `predicate` and return it
    pub async fn wait_for<F>(&self, predicate: F) -> Result<AppState>
    where
        F: FnMut(&AppState) -> bool,
    {
        let mut receiver = self.state.clone();
        let state = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| Error::Internal("store stopped before condition was met".to_string()))?;
        Ok(state.clone())
    }

    /// Stop accepting actions and wait for the apply loop to drain
    pub async fn shutdown(self) {
        drop(self.actions);
        if let Err(e) = self.task.await {
            debug!("Store task ended abnormally: {}", e);
        }
    }
}

async fn apply_loop(
    mut state: AppState,
    mut queue: mpsc::UnboundedReceiver<AppAction>,
    publisher: watch::Sender<AppState>,
    runner: EffectRunner,
) {
    while let Some(action) = queue.recv().await {
        trace!("Applying {:?}", action);
        let effects = state.reduce(action);
        publisher.send_replace(state.clone());

        for effect in effects {
            runner.spawn(effect);
        }
    }
    debug!("Store apply loop finished");
}

/// Lifecycle calls must reach the bridge in emission order
async fn lifecycle_loop(mut queue: mpsc::UnboundedReceiver<Effect>, executor: EffectExecutor) {
    while let Some(effect) = queue.recv().await {
        executor.execute(effect).await;
    }
    debug!("Lifecycle loop finished");
}

/// Routes effects to the lifecycle queue or to their own task
struct EffectRunner {
    executor: EffectExecutor,
    lifecycle: mpsc::UnboundedSender<Effect>,
}

impl EffectRunner {
    fn spawn(&self, effect: Effect) {
        debug!("Running effect {}", effect.kind());
        if effect.is_lifecycle() {
            if let Err(e) = self.lifecycle.send(effect) {
                debug!("Lifecycle loop gone; dropping {}", e.0.kind());
            }
            return;
        }
        let executor = self.executor.clone();
        tokio::spawn(async move { executor.execute(effect).await });
    }
}

/// Executes effects against the bridge
#[derive(Clone)]
struct EffectExecutor {
    bridge: Arc<dyn BridgeClient>,
    parser: Arc<ContextParser>,
    // Weak so that dropping the store closes the queue even with effects in flight
    actions: mpsc::WeakUnboundedSender<AppAction>,
}

impl EffectExecutor {
    async fn execute(&self, effect: Effect) {
        let kind = effect.kind();
        let Some(action) = self.run(effect).await else {
            return;
        };
        match self.actions.upgrade() {
            Some(actions) => {
                if actions.send(action).is_err() {
                    debug!("Store stopped; discarding {} result", kind);
                }
            }
            None => debug!("Store dropped; discarding {} result", kind),
        }
    }

    async fn run(&self, effect: Effect) -> Option<AppAction> {
        match effect {
            Effect::Install => {
                let result = self.bridge.install().await;
                Some(AppAction::Connection(ConnectionAction::InstallFinished(result)))
            }
            Effect::Connect => {
                let result = self.bridge.connect().await;
                Some(AppAction::Connection(ConnectionAction::ConnectFinished(result)))
            }
            Effect::Disconnect => {
                self.bridge.disconnect().await;
                None
            }
            Effect::Uninstall => {
                self.bridge.uninstall().await;
                None
            }
            Effect::ListTools { epoch } => {
                let result = self.bridge.list_tools().await;
                Some(AppAction::Catalog(CatalogAction::ToolsLoaded { epoch, result }))
            }
            Effect::DiscoverContexts { epoch, tool } => {
                let result = self
                    .bridge
                    .call_tool(&tool, &ToolArguments::new())
                    .await
                    .map(|response| self.parser.parse(&response.joined_text()));
                Some(AppAction::Contexts(ContextAction::Loaded { epoch, result }))
            }
            Effect::CallTool {
                session,
                epoch,
                tool,
                arguments,
            } => {
                let result = self.bridge.call_tool(&tool, &arguments).await;
                Some(AppAction::Session(SessionAction::ResultReceived {
                    session,
                    epoch,
                    result,
                }))
            }
        }
    }
}
