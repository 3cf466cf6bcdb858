//! Core types shared by the bridge boundary and the state tree
//!
//! Everything here is plain data: received from the bridge, held in state
//! snapshots, and handed to the presentation layer read-only.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Arguments dispatched to a tool, keyed by parameter name
pub type ToolArguments = BTreeMap<String, String>;

/// Lifecycle status of the bridge connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Bridge binary not installed
    #[default]
    NotInstalled,
    /// Installing the bridge binary
    Installing,
    /// Installed but not connected
    Installed,
    /// Handshake in progress
    Connecting,
    /// Connected and idle
    Connected,
    /// Connected with at least one tool call in flight
    Executing,
}

impl ConnectionStatus {
    /// Connected or executing
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Executing)
    }

    /// A lifecycle transition is in progress
    pub fn is_busy(&self) -> bool {
        matches!(self, ConnectionStatus::Installing | ConnectionStatus::Connecting)
    }

    /// Human-readable status label
    pub fn status_text(&self) -> &'static str {
        match self {
            ConnectionStatus::NotInstalled => "Not Installed",
            ConnectionStatus::Installing => "Installing…",
            ConnectionStatus::Installed => "Installed",
            ConnectionStatus::Connecting => "Connecting…",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Executing => "Executing…",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status_text())
    }
}

/// Server identity reported by the bridge handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
}

/// A remote tool as listed by the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique tool name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<SchemaObject>,
}

impl ToolDescriptor {
    /// Create a descriptor with no description or schema
    pub fn new(name: impl Into<String>) -> Self {
        ToolDescriptor {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: SchemaObject) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Object schema describing a tool's parameters
///
/// Required names missing from `properties` are tolerated; the required flag
/// is display-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySpec>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl SchemaObject {
    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(key.into(), spec);
        self
    }

    /// Mark a property as required
    pub fn with_required(mut self, key: impl Into<String>) -> Self {
        self.required.push(key.into());
        self
    }
}

/// Schema of a single parameter
///
/// Union types (`["string", "null"]`) collapse to their first non-null
/// member and non-string enum values are kept as their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "enum",
        default,
        deserialize_with = "lenient_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub enum_values: Option<Vec<String>>,
}

fn lenient_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(name) => Some(name),
        Value::Array(names) => names
            .into_iter()
            .filter_map(|name| match name {
                Value::String(name) if name != "null" => Some(name),
                _ => None,
            })
            .next(),
        _ => None,
    })
}

fn lenient_enum<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => Some(
            values
                .into_iter()
                .filter(|value| !value.is_null())
                .map(|value| match value {
                    Value::String(text) => text,
                    other => other.to_string(),
                })
                .collect(),
        ),
        _ => None,
    })
}

impl PropertySpec {
    /// A property of the given JSON type
    pub fn typed(property_type: impl Into<String>) -> Self {
        PropertySpec {
            property_type: Some(property_type.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// One content part of a tool result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart { text: Some(text.into()) }
    }
}

/// Outcome of a tool invocation that reached the bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(rename = "content", default)]
    pub content_parts: Vec<ContentPart>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl InvocationResult {
    /// A successful result with a single text part
    pub fn success(text: impl Into<String>) -> Self {
        InvocationResult {
            content_parts: vec![ContentPart::text(text)],
            is_error: false,
        }
    }

    /// A tool-reported error with a single text part
    pub fn failure(text: impl Into<String>) -> Self {
        InvocationResult {
            content_parts: vec![ContentPart::text(text)],
            is_error: true,
        }
    }

    /// Every text part joined with newlines, empty parts included
    pub fn joined_text(&self) -> String {
        self.content_parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Non-empty text parts joined with newlines, `None` if there are none
    pub fn result_text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .content_parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// An addressable execution target discovered from the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub context_id: String,
    pub location_path: String,
}

impl ExecutionContext {
    pub fn new(context_id: impl Into<String>, location_path: impl Into<String>) -> Self {
        ExecutionContext {
            context_id: context_id.into(),
            location_path: location_path.into(),
        }
    }

    /// `"<id> — <last path component>"`
    pub fn display_name(&self) -> String {
        let name = Path::new(&self.location_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.location_path.clone());
        format!("{} — {}", self.context_id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        assert!(ConnectionStatus::Executing.is_connected());
        assert!(!ConnectionStatus::Installed.is_connected());
        assert!(ConnectionStatus::Connecting.is_busy());
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::NotInstalled);
        assert_eq!(ConnectionStatus::Installing.to_string(), "Installing…");
    }

    #[test]
    fn test_result_text_skips_empty_parts() {
        let result = InvocationResult {
            content_parts: vec![
                ContentPart::text("first"),
                ContentPart::default(),
                ContentPart::text(""),
                ContentPart::text("second"),
            ],
            is_error: false,
        };
        assert_eq!(result.result_text().as_deref(), Some("first\nsecond"));

        let empty = InvocationResult::default();
        assert_eq!(empty.result_text(), None);
    }

    #[test]
    fn test_tool_descriptor_deserialize() {
        let json = serde_json::json!({
            "name": "BuildProject",
            "description": "Build the active scheme",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "tabIdentifier": { "type": "string" },
                    "configuration": { "type": "string", "enum": ["Debug", "Release"] }
                },
                "required": ["tabIdentifier"]
            }
        });

        let tool: ToolDescriptor = serde_json::from_value(json).unwrap();
        let schema = tool.input_schema.unwrap();
        assert_eq!(schema.properties.len(), 2);
        assert_eq!(schema.required, vec!["tabIdentifier".to_string()]);
        assert_eq!(
            schema.properties["configuration"].enum_values.as_deref(),
            Some(&["Debug".to_string(), "Release".to_string()][..])
        );
    }

    #[test]
    fn test_property_spec_tolerates_unions_and_scalars() {
        let spec: PropertySpec = serde_json::from_value(serde_json::json!({
            "type": ["null", "integer"],
            "enum": [1, 2, null, "three"]
        }))
        .unwrap();

        assert_eq!(spec.property_type.as_deref(), Some("integer"));
        assert_eq!(
            spec.enum_values,
            Some(vec!["1".to_string(), "2".to_string(), "three".to_string()])
        );
    }

    #[test]
    fn test_display_name_uses_last_component() {
        let ctx = ExecutionContext::new("windowtab1", "/Users/dev/App/App.xcodeproj");
        assert_eq!(ctx.display_name(), "windowtab1 — App.xcodeproj");
    }
}
