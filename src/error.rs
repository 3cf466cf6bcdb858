//! Error types for mcp-workbench

use thiserror::Error;

/// Result type alias using mcp-workbench's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mcp-workbench
#[derive(Error, Debug)]
pub enum Error {
    /// Bridge binary missing or not runnable
    #[error("Install error: {0}")]
    Install(String),

    /// Handshake or protocol mismatch while connecting
    #[error("Connect error: {0}")]
    Connect(String),

    /// Request-level failure for list/call operations
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<json5::Error> for Error {
    fn from(err: json5::Error) -> Self {
        Error::Config(err.to_string())
    }
}
