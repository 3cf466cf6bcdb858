//! Configuration module
//!
//! - types/: Config and its sections (bridge, discovery, logging)
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::bridge::BridgeConfig;
pub use types::discovery::DiscoveryConfig;
pub use types::{Config, LoggingConfig};

pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
