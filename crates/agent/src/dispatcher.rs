//! Tool dispatcher.
//!
//! Executes one tool call and folds every outcome into a [`ToolResult`]:
//! unknown tools, invalid arguments, credential failures, transport errors,
//! timeouts and server-flagged errors all become `Failure`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mcpagent_core::error::{AuthError, ToolError, TransportError};
use mcpagent_core::tool::{ToolPayload, ToolResult};
use mcpagent_core::transport::{CallOutput, CredentialSupplier, ToolTransport};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::binding::BoundTool;

pub struct ToolDispatcher {
    transport: Arc<dyn ToolTransport>,
    credentials: Arc<dyn CredentialSupplier>,
    tools: HashMap<String, BoundTool>,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(
        transport: Arc<dyn ToolTransport>,
        credentials: Arc<dyn CredentialSupplier>,
        tools: Vec<BoundTool>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            credentials,
            tools: tools.into_iter().map(|t| (t.name.clone(), t)).collect(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dispatch one call. Never fails: errors become `Failure(text)`.
    pub async fn call(&self, name: &str, arguments: &Map<String, Value>) -> ToolResult {
        match self.try_call(name, arguments).await {
            Ok(payload) => ToolResult::Success(payload),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                ToolResult::Failure(e.to_string())
            }
        }
    }

    /// Dispatch one call, keeping the typed error.
    pub async fn try_call(&self, name: &str, arguments: &Map<String, Value>) -> Result<ToolPayload, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tool.validate(arguments)
            .map_err(|reason| ToolError::InvalidArguments {
                tool_name: name.to_string(),
                reason,
            })?;

        let credential = self
            .credentials
            .credential()
            .await
            .map_err(|source| ToolError::Auth {
                tool_name: name.to_string(),
                source,
            })?;

        debug!(tool = %name, timeout_ms = self.timeout.as_millis() as u64, "Dispatching tool call");

        let output = self
            .transport
            .call_tool(name, arguments, credential.as_deref(), self.timeout)
            .await
            .map_err(|e| transport_failure(name, e))?;

        normalize_output(name, output)
    }
}

fn transport_failure(tool: &str, err: TransportError) -> ToolError {
    match err {
        TransportError::Timeout { timeout_ms } => ToolError::Timeout {
            tool_name: tool.to_string(),
            timeout_ms,
        },
        TransportError::Unauthorized(reason) => ToolError::Auth {
            tool_name: tool.to_string(),
            source: AuthError::Rejected(reason),
        },
        other => ToolError::Transport {
            tool_name: tool.to_string(),
            source: other,
        },
    }
}

/// Pick the canonical payload: structured data, else text content, else the
/// raw response rendered as a string.
pub fn normalize_output(tool: &str, output: CallOutput) -> Result<ToolPayload, ToolError> {
    if output.is_error {
        let reason = output
            .text
            .or_else(|| output.structured.map(|v| v.to_string()))
            .unwrap_or_else(|| raw_text(&output.raw));
        return Err(ToolError::ExecutionFailed {
            tool_name: tool.to_string(),
            reason,
        });
    }

    Ok(match (output.structured, output.text) {
        (Some(value), _) => ToolPayload::Structured(value),
        (None, Some(text)) => ToolPayload::Text(text),
        (None, None) => ToolPayload::Text(raw_text(&output.raw)),
    })
}

fn raw_text(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
