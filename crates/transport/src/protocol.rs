//! JSON-RPC 2.0 envelopes and MCP result decoding.

use mcpagent_core::error::TransportError;
use mcpagent_core::transport::{CallOutput, RawToolEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision sent in `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC request. A notification has no id.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: None,
            method: method.into(),
            params: None,
        }
    }
}

/// JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    /// The result, or the remote error as a transport error.
    pub fn into_result(self) -> Result<Value, TransportError> {
        if let Some(err) = self.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        self.result
            .ok_or_else(|| TransportError::Protocol("response has neither result nor error".into()))
    }

    fn answers(&self, id: u64) -> bool {
        self.id.as_ref().and_then(Value::as_u64) == Some(id)
    }
}

/// Decode the response to request `id` from a response body.
///
/// Servers answer either with a plain JSON body or with an SSE stream whose
/// `data:` frames carry JSON-RPC messages; in the latter case the frame
/// answering `id` is picked and server notifications are skipped.
pub fn decode_response(content_type: &str, body: &str, id: u64) -> Result<JsonRpcResponse, TransportError> {
    if content_type.starts_with("text/event-stream") {
        for data in sse_data_frames(body) {
            match serde_json::from_str::<JsonRpcResponse>(&data) {
                Ok(response) if response.answers(id) => return Ok(response),
                Ok(_) => continue,
                Err(e) => {
                    tracing::trace!(error = %e, data = %data, "Skipping unparseable SSE frame");
                }
            }
        }
        return Err(TransportError::Protocol(format!(
            "event stream carried no response for request {id}"
        )));
    }

    serde_json::from_str(body)
        .map_err(|e| TransportError::Protocol(format!("invalid JSON-RPC response: {e}")))
}

/// Join the `data:` lines of each SSE event.
fn sse_data_frames(body: &str) -> Vec<String> {
    let mut frames = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            if !current.is_empty() {
                frames.push(current.join("\n"));
                current.clear();
            }
        } else if let Some(data) = line.strip_prefix("data:") {
            current.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }
    if !current.is_empty() {
        frames.push(current.join("\n"));
    }
    frames
}

/// One page of a `tools/list` result.
#[derive(Debug, Deserialize)]
pub struct ToolsPage {
    #[serde(default)]
    pub tools: Vec<Value>,
    #[serde(default, rename = "nextCursor")]
    pub next_cursor: Option<String>,
}

/// Decode the raw catalog entries of one page.
///
/// Entries are kept loosely typed: a wrongly-typed field becomes `None`
/// and the catalog adapter decides whether that is fatal.
pub fn decode_tools_page(result: Value) -> Result<(Vec<RawToolEntry>, Option<String>), TransportError> {
    let page: ToolsPage = serde_json::from_value(result)
        .map_err(|e| TransportError::Protocol(format!("invalid tools/list result: {e}")))?;

    let entries = page
        .tools
        .into_iter()
        .map(|tool| RawToolEntry {
            name: tool.get("name").and_then(Value::as_str).map(String::from),
            description: tool
                .get("description")
                .and_then(Value::as_str)
                .map(String::from),
            input_schema: tool.get("inputSchema").cloned(),
        })
        .collect();

    Ok((entries, page.next_cursor.filter(|c| !c.is_empty())))
}

/// Decode a `tools/call` result.
pub fn decode_call_result(result: Value) -> CallOutput {
    let structured = result
        .get("structuredContent")
        .filter(|v| !v.is_null())
        .cloned();

    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    let text = (!texts.is_empty()).then(|| texts.join("\n"));
    let is_error = result
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    CallOutput {
        structured,
        text,
        raw: result,
        is_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(3, "tools/list", Some(json!({})));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 3);

        let note = JsonRpcRequest::notification("notifications/initialized");
        let value = serde_json::to_value(&note).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
    }

    #[test]
    fn decode_plain_json() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
        let resp = decode_response("application/json", body, 1).unwrap();
        assert_eq!(resp.into_result().unwrap()["ok"], true);
    }

    #[test]
    fn decode_sse_picks_matching_id() {
        let body = concat!(
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n",
            "\n",
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":7,\"result\":{\"v\":1}}\n",
            "\n",
        );
        let resp = decode_response("text/event-stream", body, 7).unwrap();
        assert_eq!(resp.into_result().unwrap()["v"], 1);
    }

    #[test]
    fn decode_sse_without_answer_is_protocol_error() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n";
        let err = decode_response("text/event-stream", body, 2).unwrap_err();
        assert!(matches!(err, TransportError::Protocol(_)));
    }

    #[test]
    fn rpc_error_maps_to_transport_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"no such method"}}"#;
        let err = decode_response("application/json", body, 1)
            .unwrap()
            .into_result()
            .unwrap_err();
        assert!(matches!(err, TransportError::Rpc { code: -32601, .. }));
    }

    #[test]
    fn tools_page_keeps_wrongly_typed_fields_as_none() {
        let (entries, cursor) = decode_tools_page(json!({
            "tools": [
                {"name": "lookup", "description": "Weather", "inputSchema": {"type": "object"}},
                {"name": 42}
            ],
            "nextCursor": "page-2"
        }))
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name.as_deref(), Some("lookup"));
        assert!(entries[1].name.is_none());
        assert_eq!(cursor.as_deref(), Some("page-2"));
    }

    #[test]
    fn call_result_collects_text_blocks_and_structured() {
        let out = decode_call_result(json!({
            "content": [
                {"type": "text", "text": "22C"},
                {"type": "image", "data": "..."},
                {"type": "text", "text": "sunny"}
            ],
            "structuredContent": {"temp": 22},
            "isError": false
        }));
        assert_eq!(out.text.as_deref(), Some("22C\nsunny"));
        assert_eq!(out.structured, Some(json!({"temp": 22})));
        assert!(!out.is_error);
    }

    #[test]
    fn call_result_error_flag() {
        let out = decode_call_result(json!({
            "content": [{"type": "text", "text": "city not found"}],
            "isError": true
        }));
        assert!(out.is_error);
        assert!(out.structured.is_none());
    }
}
