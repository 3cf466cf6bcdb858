//! # MCP Workbench
//!
//! A client for exercising the tools an IDE exposes through an MCP bridge
//! process.
//!
//! ## Features
//!
//! - **Bridge lifecycle:** install check, handshake, disconnect and uninstall
//! - **Tool catalog:** sorted, filterable, with per-tool invocation sessions
//! - **Context discovery:** open workspaces auto-fill the context parameter
//! - **Unidirectional store:** reducers, effects and a single-writer apply loop

pub mod config;
pub mod core;
pub mod error;
pub mod mcp;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
