//! Debug diagnostics for the tool-calling loop.
//!
//! Enabled per agent with `AgentSettings::debug_diagnostics`. Everything
//! here logs at debug level except the linkage check, whose mismatches the
//! loop logs as warnings. None of it changes the outcome of a run.

use std::collections::BTreeSet;

use mcpagent_core::message::{Message, ToolCallRequest};
use tracing::debug;

use crate::binding::BoundTool;

/// Messages shown by [`log_history_tail`].
const TAIL_LEN: usize = 4;

/// Characters kept of each message preview.
const PREVIEW_CHARS: usize = 200;

pub fn log_bound_tools(tools: &[BoundTool]) {
    for tool in tools {
        let definition = tool.to_definition();
        debug!(
            tool = %tool.name,
            schema = %definition.parameters,
            "Bound tool schema"
        );
    }
}

/// Log the last few messages before a model invocation.
pub fn log_history_tail(messages: &[Message]) {
    let start = messages.len().saturating_sub(TAIL_LEN);
    for (index, message) in messages.iter().enumerate().skip(start) {
        debug!(
            index,
            role = message.role_name(),
            tool_calls = message.tool_calls().len(),
            content = %preview(message.content()),
            "History tail"
        );
    }
}

pub fn log_tool_calls(calls: &[ToolCallRequest]) {
    for call in calls {
        debug!(
            id = %call.id,
            tool = %call.name,
            arguments = %call.arguments_value(),
            "Model requested tool call"
        );
    }
}

/// Check that the last batch of tool calls is fully answered.
///
/// Every id requested by the last assistant message with tool calls must
/// have exactly one Tool message after it, and no Tool message there may
/// reference an id that was not requested.
pub fn check_tool_linkage(messages: &[Message]) -> Result<(), String> {
    let Some(position) = messages
        .iter()
        .rposition(|m| !m.tool_calls().is_empty())
    else {
        return Ok(());
    };

    let requested: BTreeSet<&str> = messages[position]
        .tool_calls()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    let answered: BTreeSet<&str> = messages[position + 1..]
        .iter()
        .filter_map(|m| match m {
            Message::Tool { tool_call_id, .. } => Some(tool_call_id.as_str()),
            _ => None,
        })
        .collect();

    let mut problems: Vec<String> = answered
        .difference(&requested)
        .map(|id| format!("tool message references unknown call id '{id}'"))
        .collect();
    problems.extend(
        requested
            .difference(&answered)
            .map(|id| format!("call id '{id}' has no tool message")),
    );
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("; "))
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
