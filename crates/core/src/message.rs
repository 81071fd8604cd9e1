//! Message and history domain types.
//!
//! These are the value objects that flow through one `answer` call:
//! history + question → messages → model → tool calls → tool messages → model.
//! Messages carry no ids or timestamps, so building the same conversation
//! twice yields structurally identical values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single message in a conversation.
///
/// Order is append-only and significant: it reconstructs causality for the
/// next model invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System instructions
    System { content: String },
    /// The end user
    User { content: String },
    /// The model, optionally requesting tool calls
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    /// Result of one tool call
    Tool {
        /// Id of the originating [`ToolCallRequest`]
        tool_call_id: String,
        /// Name of the tool that produced this content
        name: String,
        /// Success payload or error text
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// An assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An assistant message requesting tool calls.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Text content regardless of variant.
    pub fn content(&self) -> &str {
        match self {
            Self::System { content }
            | Self::User { content }
            | Self::Assistant { content, .. }
            | Self::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by this message (empty unless Assistant).
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn role_name(&self) -> &'static str {
        match self {
            Self::System { .. } => "system",
            Self::User { .. } => "user",
            Self::Assistant { .. } => "assistant",
            Self::Tool { .. } => "tool",
        }
    }
}

/// A model-issued request to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Correlates the request with its Tool message
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Parameter name → value
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCallRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a JSON object value (for events and metadata).
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

/// Who wrote a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One prior turn supplied by the caller, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
        }
    }

    /// Convert into the conversation message it represents.
    pub fn to_message(&self) -> Message {
        match self.role {
            HistoryRole::User => Message::user(&self.content),
            HistoryRole::Assistant => Message::assistant(&self.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Hello, agent!");
        assert_eq!(msg.role_name(), "user");
        assert_eq!(msg.content(), "Hello, agent!");
        assert!(msg.tool_calls().is_empty());
    }

    #[test]
    fn assistant_with_calls_exposes_them() {
        let mut args = Map::new();
        args.insert("city".into(), json!("Rome"));
        let msg = Message::assistant_with_calls("", vec![ToolCallRequest::new("c1", "lookup", args)]);
        assert_eq!(msg.tool_calls().len(), 1);
        assert_eq!(msg.tool_calls()[0].arguments_value(), json!({"city": "Rome"}));
    }

    #[test]
    fn message_serialization_is_role_tagged() {
        let msg = Message::tool_result("c1", "lookup", "22C");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "c1");

        let back: Message = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn identical_construction_is_structurally_equal() {
        assert_eq!(Message::user("q"), Message::user("q"));
        assert_eq!(Message::system("s"), Message::system("s"));
    }

    #[test]
    fn history_entry_parses_role() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(entry.role, HistoryRole::Assistant);
        assert_eq!(entry.to_message(), Message::assistant("hi"));
    }
}
