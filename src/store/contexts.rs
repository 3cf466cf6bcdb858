//! Context registry
//!
//! Execution contexts (window tabs) are discovered by invoking a designated
//! tool and parsing whatever text it returns. The output is either JSON or a
//! loose `key: value` listing, so parsing tries a structured decode first and
//! falls back to scanning lines. Discovery is best-effort: failures are
//! logged and leave the previous contexts in place.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DiscoveryConfig;
use crate::core::ExecutionContext;
use crate::error::Result;

use super::effect::Effect;

/// Field holding the entry list in structured responses
const ENTRY_LIST_FIELD: &str = "windows";

/// Location used when an entry has no path
const UNKNOWN_LOCATION: &str = "Unknown";

/// Characters stripped from both ends of a line-format value
const VALUE_NOISE: &[char] = &['"', '{', '}', '[', ']', '\n', '\r'];

/// Context registry actions
#[derive(Debug)]
pub enum ContextAction {
    Refresh,
    Loaded {
        epoch: u64,
        result: Result<Vec<ExecutionContext>>,
    },
}

/// Known execution contexts, in parse order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextRegistry {
    pub contexts: Vec<ExecutionContext>,
    /// A discovery call for the current connection is outstanding
    pub is_discovering: bool,
    /// Completed discovery rounds, successful or not; never reset
    pub discoveries: u64,
    /// Epoch of the most recently scheduled discovery still awaiting its result
    #[serde(skip)]
    pending_epoch: Option<u64>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scheduled effects and whether `contexts` was replaced
    pub fn reduce(&mut self, action: ContextAction, epoch: u64, tool: &str) -> (Vec<Effect>, bool) {
        match action {
            ContextAction::Refresh => {
                debug!("Discovering execution contexts via {}", tool);
                self.pending_epoch = Some(epoch);
                self.is_discovering = true;
                (
                    vec![Effect::DiscoverContexts {
                        epoch,
                        tool: tool.to_string(),
                    }],
                    false,
                )
            }
            ContextAction::Loaded { epoch: loaded, result } => {
                if loaded != epoch {
                    debug!("Discarding contexts from stale connection");
                    // Only a discovery scheduled on the current connection keeps the flag up
                    if self.pending_epoch != Some(epoch) {
                        self.pending_epoch = None;
                        self.is_discovering = false;
                    }
                    return (vec![], false);
                }
                self.pending_epoch = None;
                self.is_discovering = false;
                self.discoveries += 1;
                match result {
                    Ok(contexts) => {
                        debug!("Discovered {} execution contexts", contexts.len());
                        self.contexts = contexts;
                        (vec![], true)
                    }
                    Err(e) => {
                        warn!("Context discovery failed: {}", e);
                        (vec![], false)
                    }
                }
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.contexts.clear();
        self.is_discovering = false;
        self.pending_epoch = None;
    }
}

/// Parses discovery tool output into execution contexts
#[derive(Debug, Clone)]
pub struct ContextParser {
    id_fields: Vec<String>,
    path_fields: Vec<String>,
}

impl Default for ContextParser {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

impl ContextParser {
    pub fn new<I, J, S, T>(id_fields: I, path_fields: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        ContextParser {
            id_fields: id_fields.into_iter().map(Into::into).collect(),
            path_fields: path_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.id_fields.iter().cloned(), config.path_fields.iter().cloned())
    }

    /// Structured parse first; line scan over the full text if that yields nothing
    pub fn parse(&self, text: &str) -> Vec<ExecutionContext> {
        let contexts = self.parse_structured(text);
        if !contexts.is_empty() {
            return contexts;
        }
        self.parse_lines(text)
    }

    fn parse_structured(&self, text: &str) -> Vec<ExecutionContext> {
        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            Err(_) => return Vec::new(),
        };

        let entries = match value.get(ENTRY_LIST_FIELD).unwrap_or(&value) {
            Value::Array(entries) => entries,
            _ => return Vec::new(),
        };

        entries
            .iter()
            .filter_map(|entry| {
                let id = self
                    .id_fields
                    .iter()
                    .filter_map(|field| entry.get(field).and_then(Value::as_str))
                    .find(|id| !id.is_empty())?;
                let path = self
                    .path_fields
                    .iter()
                    .find_map(|field| entry.get(field).and_then(Value::as_str))
                    .unwrap_or(UNKNOWN_LOCATION);
                Some(ExecutionContext::new(id, path))
            })
            .collect()
    }

    fn parse_lines(&self, text: &str) -> Vec<ExecutionContext> {
        let mut contexts = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if !self.id_fields.iter().any(|field| line.contains(field.as_str())) {
                continue;
            }

            let id = self
                .id_fields
                .iter()
                .filter_map(|field| marker_value(line, field))
                .find(|id| !id.is_empty());
            let Some(id) = id else {
                continue;
            };

            let path = self
                .path_fields
                .iter()
                .find_map(|field| marker_value(line, field))
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

            contexts.push(ExecutionContext::new(id, path));
        }

        contexts
    }
}

/// Value following `<field>:` on the line, if the marker is present
fn marker_value(line: &str, field: &str) -> Option<String> {
    let marker = format!("{}:", field);
    let start = line.find(&marker)? + marker.len();
    Some(extract_value(&line[start..]))
}

/// Text up to the next comma, stripped of quote, brace and bracket noise
/// and of escaped newlines
fn extract_value(after: &str) -> String {
    let after = after.trim();
    let value = match after.find(',') {
        Some(comma) => &after[..comma],
        None => after,
    };
    value
        .trim()
        .trim_matches(VALUE_NOISE)
        .replace("\\n", "")
        .trim()
        .to_string()
}
