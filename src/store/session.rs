//! Invocation session
//!
//! Ephemeral state for configuring and invoking exactly one tool. A session
//! snapshots the tool descriptor when it opens, so later catalog refreshes
//! never change its schema. Parameters are kept as strings; the bridge is
//! responsible for coercing them.

use serde::Serialize;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::core::{ExecutionContext, InvocationResult, ToolArguments, ToolDescriptor};
use crate::error::Result;

use super::effect::Effect;

/// Error shown when the tool itself reports a failure
pub const TOOL_ERROR_MESSAGE: &str = "Tool returned an error";

/// Default JSON type for properties that omit one
const DEFAULT_FIELD_TYPE: &str = "string";

/// Identity of one session; results for any other id are stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Session actions
#[derive(Debug)]
pub enum SessionAction {
    SetParameter { key: String, value: String },
    Execute,
    ClearResult,
    ResultReceived {
        session: SessionId,
        epoch: u64,
        result: Result<InvocationResult>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Idle,
    Executing,
}

/// One editable field derived from the tool's input schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterField {
    pub key: String,
    pub field_type: String,
    pub description: Option<String>,
    pub is_required: bool,
    pub enum_values: Option<Vec<String>>,
}

/// How a field should be edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "options", rename_all = "snake_case")]
pub enum FieldWidget {
    /// Pick one of the known execution contexts
    ContextPicker,
    /// Pick one of the schema's enum values
    Enumerated(Vec<String>),
    Boolean,
    FreeText,
}

impl FieldWidget {
    /// Classify a field. The context picker only applies once contexts are known.
    pub fn classify(field: &ParameterField, context_parameter: &str, contexts: &[ExecutionContext]) -> Self {
        if field.key == context_parameter && !contexts.is_empty() {
            return FieldWidget::ContextPicker;
        }
        match field.enum_values.as_deref() {
            Some(values) if !values.is_empty() => FieldWidget::Enumerated(values.to_vec()),
            _ if field.field_type == "boolean" => FieldWidget::Boolean,
            _ => FieldWidget::FreeText,
        }
    }
}

/// Configuration and invocation state for one selected tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationSession {
    id: SessionId,
    tool: ToolDescriptor,
    /// Only touched fields are present; a missing key means unset
    pub parameters: ToolArguments,
    pub result: Option<InvocationResult>,
    pub error: Option<String>,
    pub phase: SessionPhase,
    pub contexts: Vec<ExecutionContext>,
}

impl InvocationSession {
    pub fn new(tool: ToolDescriptor, contexts: Vec<ExecutionContext>) -> Self {
        InvocationSession {
            id: SessionId::new(),
            tool,
            parameters: ToolArguments::new(),
            result: None,
            error: None,
            phase: SessionPhase::Idle,
            contexts,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn tool(&self) -> &ToolDescriptor {
        &self.tool
    }

    pub fn is_executing(&self) -> bool {
        self.phase == SessionPhase::Executing
    }

    /// `epoch` tags the dispatched call with the current connection
    pub fn reduce(&mut self, action: SessionAction, epoch: u64) -> Vec<Effect> {
        match action {
            SessionAction::SetParameter { key, value } => {
                self.parameters.insert(key, value);
                vec![]
            }

            SessionAction::Execute => {
                if self.is_executing() {
                    debug!("Rejecting execute of {}: already executing", self.tool.name);
                    return vec![];
                }
                self.phase = SessionPhase::Executing;
                self.result = None;
                self.error = None;

                let arguments = self.dispatch_arguments();
                debug!("Executing {} with {} arguments", self.tool.name, arguments.len());
                vec![Effect::CallTool {
                    session: self.id,
                    epoch,
                    tool: self.tool.name.clone(),
                    arguments,
                }]
            }

            SessionAction::ClearResult => {
                if self.is_executing() {
                    debug!("Ignoring clear while executing {}", self.tool.name);
                    return vec![];
                }
                self.result = None;
                self.error = None;
                vec![]
            }

            SessionAction::ResultReceived { session, result, .. } => {
                if session != self.id {
                    debug!("Discarding result for session {}", session);
                    return vec![];
                }
                self.phase = SessionPhase::Idle;
                match result {
                    Ok(result) => {
                        if result.is_error {
                            self.error = Some(TOOL_ERROR_MESSAGE.to_string());
                        }
                        self.result = Some(result);
                    }
                    Err(e) => {
                        self.error = Some(e.to_string());
                    }
                }
                vec![]
            }
        }
    }

    /// Parameters with non-empty values; empty strings count as not provided
    pub fn dispatch_arguments(&self) -> ToolArguments {
        self.parameters
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Replace the known contexts and auto-fill the context parameter when
    /// exactly one context exists, the schema declares the parameter, and the
    /// user has not set it.
    pub fn apply_contexts(&mut self, contexts: &[ExecutionContext], context_parameter: &str) {
        self.contexts = contexts.to_vec();

        let [only] = contexts else {
            return;
        };
        let declared = self
            .tool
            .input_schema
            .as_ref()
            .map_or(false, |schema| schema.properties.contains_key(context_parameter));
        let unset = self
            .parameters
            .get(context_parameter)
            .map_or(true, |value| value.is_empty());

        if declared && unset {
            debug!("Auto-filling {} with {}", context_parameter, only.context_id);
            self.parameters
                .insert(context_parameter.to_string(), only.context_id.clone());
        }
    }

    /// Schema properties in ascending key order
    pub fn parameter_fields(&self) -> Vec<ParameterField> {
        let Some(schema) = self.tool.input_schema.as_ref() else {
            return Vec::new();
        };

        schema
            .properties
            .iter()
            .map(|(key, spec)| ParameterField {
                key: key.clone(),
                field_type: spec
                    .property_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_FIELD_TYPE.to_string()),
                description: spec.description.clone(),
                is_required: schema.required.iter().any(|r| r == key),
                enum_values: spec.enum_values.clone(),
            })
            .collect()
    }

    /// Fields paired with how each should be edited
    pub fn field_widgets(&self, context_parameter: &str) -> Vec<(ParameterField, FieldWidget)> {
        self.parameter_fields()
            .into_iter()
            .map(|field| {
                let widget = FieldWidget::classify(&field, context_parameter, &self.contexts);
                (field, widget)
            })
            .collect()
    }

    pub fn result_text(&self) -> Option<String> {
        self.result.as_ref().and_then(InvocationResult::result_text)
    }
}
