//! Root state tree
//!
//! Composes the connection, catalog, context registry and the optional
//! invocation session. Child actions are delegated to the owning component;
//! the root wires the cross-component reactions:
//!
//! - connect succeeded -> catalog refresh
//! - catalog loaded -> context discovery
//! - contexts loaded -> merged into the open session (with auto-fill)
//! - disconnected -> catalog, session and contexts reset
//! - tool selected -> session opened (replacing any previous one)

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::core::{ExecutionContext, ToolDescriptor};

use super::catalog::{CatalogAction, CatalogEvent, ToolCatalog};
use super::connection::{ConnectionAction, ConnectionEvent, ConnectionState};
use super::contexts::{ContextAction, ContextRegistry};
use super::effect::Effect;
use super::session::{InvocationSession, SessionAction};

/// Every action the root reducer understands
#[derive(Debug)]
pub enum AppAction {
    Connection(ConnectionAction),
    Catalog(CatalogAction),
    Contexts(ContextAction),
    Session(SessionAction),
    CloseSession,
}

/// User intents emitted by the presentation layer
///
/// Completion actions (results coming back from the bridge) are not
/// expressible here, so a presentation layer can only request work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Connect,
    Disconnect,
    Uninstall,
    RefreshTools,
    SetFilter(String),
    Select(ToolDescriptor),
    ClearSelection,
    SetParameter { key: String, value: String },
    Execute,
    ClearResult,
    CloseSession,
    RefreshContexts,
}

impl From<Intent> for AppAction {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Connect => AppAction::Connection(ConnectionAction::Connect),
            Intent::Disconnect => AppAction::Connection(ConnectionAction::Disconnect),
            Intent::Uninstall => AppAction::Connection(ConnectionAction::Uninstall),
            Intent::RefreshTools => AppAction::Catalog(CatalogAction::Refresh),
            Intent::SetFilter(text) => AppAction::Catalog(CatalogAction::SetFilter(text)),
            Intent::Select(tool) => AppAction::Catalog(CatalogAction::Select(tool)),
            Intent::ClearSelection => AppAction::Catalog(CatalogAction::ClearSelection),
            Intent::SetParameter { key, value } => {
                AppAction::Session(SessionAction::SetParameter { key, value })
            }
            Intent::Execute => AppAction::Session(SessionAction::Execute),
            Intent::ClearResult => AppAction::Session(SessionAction::ClearResult),
            Intent::CloseSession => AppAction::CloseSession,
            Intent::RefreshContexts => AppAction::Contexts(ContextAction::Refresh),
        }
    }
}

/// The whole observable state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub connection: ConnectionState,
    pub catalog: ToolCatalog,
    pub contexts: ContextRegistry,
    pub session: Option<InvocationSession>,
    #[serde(skip)]
    discovery: DiscoveryConfig,
}

impl AppState {
    pub fn new(discovery: DiscoveryConfig) -> Self {
        AppState {
            discovery,
            ..Default::default()
        }
    }

    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// Known execution contexts
    pub fn available_contexts(&self) -> &[ExecutionContext] {
        &self.contexts.contexts
    }

    /// Apply one action and return the effects to schedule
    pub fn reduce(&mut self, action: AppAction) -> Vec<Effect> {
        match action {
            AppAction::Connection(action) => {
                let (mut effects, event) = self.connection.reduce(action);
                match event {
                    Some(ConnectionEvent::Connected) => {
                        effects.extend(self.reduce(AppAction::Catalog(CatalogAction::Refresh)));
                    }
                    Some(ConnectionEvent::Disconnected) => self.reset(),
                    None => {}
                }
                effects
            }

            AppAction::Catalog(action) => {
                let (mut effects, event) = self.catalog.reduce(action, self.connection.epoch());
                match event {
                    Some(CatalogEvent::Loaded) => {
                        effects.extend(self.reduce(AppAction::Contexts(ContextAction::Refresh)));
                    }
                    Some(CatalogEvent::Selected(tool)) => self.open_session(tool),
                    None => {}
                }
                effects
            }

            AppAction::Contexts(action) => {
                let (effects, replaced) =
                    self.contexts
                        .reduce(action, self.connection.epoch(), &self.discovery.tool);
                if replaced {
                    if let Some(session) = self.session.as_mut() {
                        session.apply_contexts(&self.contexts.contexts, &self.discovery.context_parameter);
                    }
                }
                effects
            }

            AppAction::Session(action) => self.reduce_session(action),

            AppAction::CloseSession => {
                self.session = None;
                self.catalog.selected_name = None;
                vec![]
            }
        }
    }

    fn reduce_session(&mut self, action: SessionAction) -> Vec<Effect> {
        let epoch = self.connection.epoch();

        if let SessionAction::ResultReceived { epoch: sent, .. } = &action {
            if *sent == epoch {
                self.connection.finish_call();
            }
        }

        let Some(session) = self.session.as_mut() else {
            match action {
                SessionAction::ResultReceived { .. } => warn!("Discarding result: session closed"),
                other => debug!("Dropping {:?}: no open session", other),
            }
            return vec![];
        };

        let effects = session.reduce(action, epoch);
        if effects.iter().any(|e| matches!(e, Effect::CallTool { .. })) {
            self.connection.begin_call();
        }
        effects
    }

    /// Open a session for `tool`, replacing any previous one
    fn open_session(&mut self, tool: ToolDescriptor) {
        debug!("Opening session for {}", tool.name);
        self.session = Some(InvocationSession::new(tool, self.contexts.contexts.clone()));
    }

    fn reset(&mut self) {
        self.catalog.reset();
        self.session = None;
        self.contexts.reset();
    }
}
