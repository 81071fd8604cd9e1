//! Tool descriptors and results.
//!
//! A [`ToolDescriptor`] is what discovery produces: immutable, fetched once per
//! agent and shared read-only by every call. A [`ToolResult`] is what dispatch
//! produces for one call; it never carries a raw transport error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A discovered tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name within the catalog
    pub name: String,

    /// Human-readable description (sent to the model)
    pub description: String,

    /// Canonical object schema of the tool's parameters
    pub parameters: ParameterSchema,
}

/// Canonical object schema: named parameters plus the required set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Declared properties, in schema order
    pub properties: Vec<PropertySchema>,

    /// Names of required properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl ParameterSchema {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    pub name: String,

    /// Declared JSON kind (`"string"`, `"integer"`, ...), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Canonical success payload of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolPayload {
    Text(String),
    Structured(Value),
}

impl ToolPayload {
    /// Content for the Tool message. Structured values are JSON-encoded once;
    /// text is passed through as-is.
    pub fn to_message_content(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Structured(Value::String(s)) => s.clone(),
            Self::Structured(value) => value.to_string(),
        }
    }

    /// Payload as a JSON value (for events and metadata).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Structured(value) => value.clone(),
        }
    }
}

/// The outcome of dispatching one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResult {
    Success(ToolPayload),
    Failure(String),
}

impl ToolResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Content for the Tool message appended to the conversation.
    ///
    /// Failures are sent as `{"error": text}` so the model can tell them apart.
    pub fn to_message_content(&self) -> String {
        match self {
            Self::Success(payload) => payload.to_message_content(),
            Self::Failure(text) => serde_json::json!({ "error": text }).to_string(),
        }
    }
}
