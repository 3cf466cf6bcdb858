//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_bridge_config(config, result);
    result = validate_discovery_config(config, result);

    result
}

fn validate_bridge_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let command = config.bridge.command.trim();

    if command.is_empty() {
        return result.with_error(
            ValidationIssue::new("bridge.command", "No bridge command configured")
                .with_suggestion("Set bridge.command or MCP_WORKBENCH_BRIDGE_COMMAND"),
        );
    }

    if which::which(command).is_err() {
        result = result.with_warning(
            ValidationIssue::new(
                "bridge.command",
                format!("Bridge command not found in PATH: {}", command),
            )
            .with_suggestion("Install the bridge or use an absolute path"),
        );
    }

    if config.bridge.request_timeout_secs == 0 {
        result = result.with_warning(ValidationIssue::new(
            "bridge.request_timeout_secs",
            "Request timeout disabled; a stalled bridge will block tool calls indefinitely",
        ));
    }

    result
}

fn validate_discovery_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.discovery.tool.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "discovery.tool",
            "No context discovery tool configured",
        ));
    }

    if config.discovery.context_parameter.trim().is_empty() {
        result = result.with_error(ValidationIssue::new(
            "discovery.context_parameter",
            "No context parameter configured",
        ));
    }

    if config.discovery.id_fields.iter().all(|f| f.trim().is_empty()) {
        result = result.with_error(
            ValidationIssue::new("discovery.id_fields", "No context id field configured")
                .with_suggestion("Use [\"tabIdentifier\", \"contextId\"]"),
        );
    }

    result
}
