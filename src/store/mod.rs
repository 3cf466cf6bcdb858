//! Store module - Unidirectional state machine over the bridge
//!
//! State is a tree of plain values; actions form a closed set of nested
//! enums; reducers are synchronous transitions from (state, action) to
//! (state, effects). The runtime serializes actions through one task and
//! executes effects concurrently against a `BridgeClient`.
//!
//! ## Components
//!
//! - **connection**: bridge lifecycle and status
//! - **catalog**: sorted, filterable tool list
//! - **contexts**: execution contexts discovered through a designated tool
//! - **session**: per-tool parameters, invocation and result
//! - **app**: root composition and cross-component reactions
//! - **runtime**: the apply loop and effect execution
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mcp_workbench::config::Config;
//! use mcp_workbench::mcp::StdioBridge;
//! use mcp_workbench::store::{Intent, Store};
//!
//! # async fn example() -> mcp_workbench::Result<()> {
//! let config = Config::from_env()?;
//! let bridge = Arc::new(StdioBridge::new(config.bridge.clone()));
//! let store = Store::spawn(bridge, config.discovery.clone());
//!
//! store.dispatch(Intent::Connect)?;
//! let state = store.wait_for(|s| !s.catalog.tools.is_empty()).await?;
//! for tool in state.catalog.filtered_tools() {
//!     println!("{}", tool.name);
//! }
//! # Ok(())
//! # }
//! ```

mod app;
mod catalog;
mod connection;
mod contexts;
mod effect;
mod runtime;
mod session;

pub use app::{AppAction, AppState, Intent};
pub use catalog::{CatalogAction, CatalogEvent, ToolCatalog};
pub use connection::{ConnectionAction, ConnectionEvent, ConnectionState};
pub use contexts::{ContextAction, ContextParser, ContextRegistry};
pub use effect::Effect;
pub use runtime::Store;
pub use session::{
    FieldWidget, InvocationSession, ParameterField, SessionAction, SessionId, SessionPhase,
    TOOL_ERROR_MESSAGE,
};
