//! Core module - Boundary trait and shared data model
//!
//! - `bridge`: the `BridgeClient` capability the runtime executes effects against
//! - `types`: tools, schemas, results, execution contexts and connection status

pub mod bridge;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::BridgeClient;
pub use types::*;
