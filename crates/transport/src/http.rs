//! MCP streamable-HTTP client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mcpagent_core::error::TransportError;
use mcpagent_core::transport::{CallOutput, RawToolEntry, ToolTransport};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::protocol::{
    JsonRpcRequest, PROTOCOL_VERSION, decode_call_result, decode_response, decode_tools_page,
};

const SESSION_HEADER: &str = "mcp-session-id";

/// Upper bound on `tools/list` pages, in case a server keeps returning cursors.
const MAX_PAGES: usize = 100;

/// Limit on the session `DELETE`, which still runs after an operation timed out.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// A tool transport speaking JSON-RPC over HTTP to one MCP endpoint.
///
/// Holds no session state between operations; each `list_tools` or
/// `call_tool` opens, uses and closes its own session. The operation timeout
/// covers opening the session and the request. Closing happens afterwards,
/// also when the request timed out.
pub struct McpHttpTransport {
    endpoint: String,
    client: reqwest::Client,
    client_name: String,
    discovery_timeout: Duration,
    next_id: AtomicU64,
}

/// An open MCP session; the server may not assign an id.
struct Session {
    id: Option<String>,
}

impl McpHttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
            client_name: "mcpagent".into(),
            discovery_timeout: Duration::from_secs(60),
            next_id: AtomicU64::new(1),
        }
    }

    /// Timeout for a whole `list_tools` operation.
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn headers(&self, session: Option<&Session>, credential: Option<&str>) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        if let Some(token) = credential {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| TransportError::Protocol("credential is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(id) = session.and_then(|s| s.id.as_deref()) {
            let value = HeaderValue::from_str(id)
                .map_err(|_| TransportError::Protocol("session id is not a valid header value".into()))?;
            headers.insert(SESSION_HEADER, value);
        }
        Ok(headers)
    }

    async fn send(
        &self,
        body: &JsonRpcRequest,
        session: Option<&Session>,
        credential: Option<&str>,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers(session, credential)?)
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Unauthorized(format!("HTTP {}: {body}", status.as_u16())));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Send a request and decode its result.
    async fn request(
        &self,
        method: &str,
        params: Value,
        session: Option<&Session>,
        credential: Option<&str>,
    ) -> Result<(Value, Option<String>), TransportError> {
        let id = self.next_id();
        let body = JsonRpcRequest::new(id, method, Some(params));
        trace!(method, id, "Sending JSON-RPC request");

        let response = self.send(&body, session, credential).await?;
        let session_id = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let result = decode_response(&content_type, &text, id)?.into_result()?;
        Ok((result, session_id))
    }

    async fn open_session(&self, credential: Option<&str>) -> Result<Session, TransportError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": { "name": self.client_name, "version": env!("CARGO_PKG_VERSION") },
        });
        let (result, session_id) = self.request("initialize", params, None, credential).await?;
        let session = Session { id: session_id };

        debug!(
            endpoint = %self.endpoint,
            session = session.id.as_deref().unwrap_or("-"),
            server = result["serverInfo"]["name"].as_str().unwrap_or("unknown"),
            "MCP session opened"
        );

        self.send(
            &JsonRpcRequest::notification("notifications/initialized"),
            Some(&session),
            credential,
        )
        .await?;
        Ok(session)
    }

    /// Best-effort session termination.
    async fn close_session(&self, session: Session, credential: Option<&str>) {
        let Some(id) = session.id.as_deref() else {
            return;
        };
        let headers = match self.headers(Some(&session), credential) {
            Ok(h) => h,
            Err(_) => return,
        };
        let sent = self
            .client
            .delete(&self.endpoint)
            .headers(headers)
            .timeout(CLOSE_TIMEOUT)
            .send()
            .await;
        if let Err(e) = sent {
            trace!(session = id, error = %e, "Failed to close MCP session");
        }
    }

    /// Open a session, giving up at `deadline`.
    async fn open_session_by(
        &self,
        deadline: Instant,
        limit: Duration,
        credential: Option<&str>,
    ) -> Result<Session, TransportError> {
        tokio::time::timeout_at(deadline, self.open_session(credential))
            .await
            .map_err(|_| TransportError::timeout(limit))?
    }

    async fn list_in_session(&self, credential: Option<&str>) -> Result<Vec<RawToolEntry>, TransportError> {
        let limit = self.discovery_timeout;
        let deadline = Instant::now() + limit;
        let session = self.open_session_by(deadline, limit, credential).await?;
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;

        let outcome = async {
            for _ in 0..MAX_PAGES {
                let params = match &cursor {
                    Some(c) => json!({ "cursor": c }),
                    None => json!({}),
                };
                let (result, _) = self
                    .request("tools/list", params, Some(&session), credential)
                    .await?;
                let (page, next) = decode_tools_page(result)?;
                entries.extend(page);
                match next {
                    Some(next) => cursor = Some(next),
                    None => return Ok(()),
                }
            }
            Err(TransportError::Protocol(format!(
                "tools/list did not finish within {MAX_PAGES} pages"
            )))
        };
        let outcome = tokio::time::timeout_at(deadline, outcome)
            .await
            .unwrap_or(Err(TransportError::timeout(limit)));

        self.close_session(session, credential).await;
        outcome.map(|_| entries)
    }

    async fn call_in_session(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        credential: Option<&str>,
        limit: Duration,
    ) -> Result<CallOutput, TransportError> {
        let deadline = Instant::now() + limit;
        let session = self.open_session_by(deadline, limit, credential).await?;
        let params = json!({ "name": name, "arguments": arguments });
        let outcome = tokio::time::timeout_at(
            deadline,
            self.request("tools/call", params, Some(&session), credential),
        )
        .await
        .unwrap_or(Err(TransportError::timeout(limit)));
        self.close_session(session, credential).await;
        let (result, _) = outcome?;
        Ok(decode_call_result(result))
    }
}

#[async_trait]
impl ToolTransport for McpHttpTransport {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn list_tools(&self, credential: Option<&str>) -> Result<Vec<RawToolEntry>, TransportError> {
        self.list_in_session(credential).await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        credential: Option<&str>,
        timeout: Duration,
    ) -> Result<CallOutput, TransportError> {
        debug!(tool = %name, endpoint = %self.endpoint, "Calling MCP tool");
        self.call_in_session(name, arguments, credential, timeout).await
    }
}
