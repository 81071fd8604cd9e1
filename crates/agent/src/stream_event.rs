//! Progress events for streaming calls.
//!
//! The serialized shape is the wire contract for UIs: one object per event
//! with a snake_case `type` tag.

use mcpagent_core::metadata::LoopMetadata;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events emitted while one streaming `answer` runs.
///
/// - `start`: first event, carries the question
/// - `tool_call`: a tool is about to be dispatched
/// - `tool_result`: the tool returned a payload
/// - `tool_error`: the tool failed; payload is `{"error": text}`
/// - `final_answer`: last event, after the loop terminated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Start { question: String },

    ToolCall { tool: String, args: Value },

    ToolResult { tool: String, args: Value, payload: Value },

    ToolError { tool: String, args: Value, payload: Value },

    FinalAnswer { answer: String, metadata: LoopMetadata },
}

impl StreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::ToolError { .. } => "tool_error",
            Self::FinalAnswer { .. } => "final_answer",
        }
    }

    /// Tool name and arguments, for the three tool events.
    pub fn tool_and_args(&self) -> Option<(&str, &Value)> {
        match self {
            Self::ToolCall { tool, args }
            | Self::ToolResult { tool, args, .. }
            | Self::ToolError { tool, args, .. } => Some((tool.as_str(), args)),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::FinalAnswer { .. })
    }
}
