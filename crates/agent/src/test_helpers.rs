//! Shared scripted collaborators for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mcpagent_core::error::{ProviderError, TransportError};
use mcpagent_core::message::{Message, ToolCallRequest};
use mcpagent_core::provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};
use mcpagent_core::transport::{CallOutput, RawToolEntry, ToolTransport};
use mcpagent_core::agent::AgentSettings;
use mcpagent_transport::NoCredentials;
use serde_json::{Map, Value, json};

use crate::binding::bind_all;
use crate::catalog::normalize_catalog;
use crate::dispatcher::ToolDispatcher;
use crate::loop_runner::ToolCallingLoop;

type Handler = Arc<dyn Fn(&Map<String, Value>) -> Result<CallOutput, TransportError> + Send + Sync>;
pub type CallLog = Arc<Mutex<Vec<(String, Map<String, Value>)>>>;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided, unless built
/// with [`repeating`](Self::repeating).
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    repeat: Option<ProviderResponse>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    delay: Option<Duration>,
    fragments: Vec<String>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Responses or errors, in order.
    pub fn scripted(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            repeat: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            delay: None,
            fragments: Vec::new(),
        }
    }

    /// Returns the same response forever.
    pub fn repeating(response: ProviderResponse) -> Self {
        Self {
            repeat: Some(response),
            ..Self::new(vec![])
        }
    }

    /// Create a provider that first returns tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<ToolCallRequest>, answer: &str) -> Self {
        Self::new(vec![make_tool_call_response(tool_calls), make_text_response(answer)])
    }

    /// Sleep before answering each invocation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Text fragments yielded by `stream`.
    pub fn with_fragments(mut self, fragments: &[&str]) -> Self {
        self.fragments = fragments.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn request_log(&self) -> Arc<Mutex<Vec<ProviderRequest>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(response) = &self.repeat {
            return Ok(response.clone());
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("SequentialMockProvider: no more responses"))
    }

    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = tokio::sync::mpsc::channel(self.fragments.len() + 1);
        for fragment in &self.fragments {
            let _ = tx.try_send(Ok(StreamChunk {
                content: Some(fragment.clone()),
                done: false,
                usage: None,
            }));
        }
        let _ = tx.try_send(Ok(StreamChunk {
            content: None,
            done: true,
            usage: None,
        }));
        Ok(rx)
    }
}

fn mock_usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

/// Create a response requesting tool calls.
pub fn make_tool_call_response(tool_calls: Vec<ToolCallRequest>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls("", tool_calls),
        usage: mock_usage(),
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call.
pub fn make_tool_call(id: &str, name: &str, args: Value) -> ToolCallRequest {
    ToolCallRequest::new(id, name, args.as_object().cloned().unwrap_or_default())
}

/// The `lookup(city: string, required)` catalog entry.
pub fn lookup_entry() -> RawToolEntry {
    RawToolEntry {
        name: Some("lookup".into()),
        description: Some("Look up the current weather for a city".into()),
        input_schema: Some(json!({
            "type": "object",
            "properties": {"city": {"type": "string", "description": "City name"}},
            "required": ["city"]
        })),
    }
}

/// A transport serving `lookup`, which always answers "22C".
pub fn weather_transport() -> ScriptedTransport {
    ScriptedTransport::new(vec![lookup_entry()]).with_handler("lookup", |_| Ok(CallOutput::text("22C")))
}

/// An in-memory tool transport with per-tool handlers.
pub struct ScriptedTransport {
    entries: Vec<RawToolEntry>,
    unreachable: bool,
    handlers: HashMap<String, Handler>,
    delay: Option<Duration>,
    calls: CallLog,
    credentials: Arc<Mutex<Vec<Option<String>>>>,
}

impl ScriptedTransport {
    pub fn new(entries: Vec<RawToolEntry>) -> Self {
        Self {
            entries,
            unreachable: false,
            handlers: HashMap::new(),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
            credentials: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::new(vec![])
        }
    }

    pub fn with_handler(
        mut self,
        name: &str,
        handler: impl Fn(&Map<String, Value>) -> Result<CallOutput, TransportError> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.calls.clone()
    }

    pub fn credentials_seen(&self) -> Vec<Option<String>> {
        self.credentials.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolTransport for ScriptedTransport {
    fn endpoint(&self) -> &str {
        "scripted://tools"
    }

    async fn list_tools(&self, credential: Option<&str>) -> Result<Vec<RawToolEntry>, TransportError> {
        self.credentials.lock().unwrap().push(credential.map(String::from));
        if self.unreachable {
            return Err(TransportError::Network("connection refused".into()));
        }
        Ok(self.entries.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        credential: Option<&str>,
        timeout: Duration,
    ) -> Result<CallOutput, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments.clone()));
        self.credentials.lock().unwrap().push(credential.map(String::from));

        let handler = self.handlers.get(name).cloned();
        let delay = self.delay;
        let work = async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match handler {
                Some(handler) => handler(arguments),
                None => Err(TransportError::Rpc {
                    code: -32602,
                    message: format!("Unknown tool: {name}"),
                }),
            }
        };
        tokio::time::timeout(timeout, work)
            .await
            .map_err(|_| TransportError::timeout(timeout))?
    }
}

/// A loop over `transport` with the `lookup` tool bound and no credentials.
pub fn lookup_loop(
    provider: SequentialMockProvider,
    transport: ScriptedTransport,
    settings: AgentSettings,
) -> ToolCallingLoop {
    let tools = bind_all(&normalize_catalog(vec![lookup_entry()]).unwrap()).unwrap();
    let definitions = tools.iter().map(|t| t.to_definition()).collect();
    let dispatcher = ToolDispatcher::new(
        Arc::new(transport),
        Arc::new(NoCredentials),
        tools,
        settings.tool_timeout,
    );
    ToolCallingLoop::new(
        Arc::new(provider),
        Arc::new(dispatcher),
        definitions,
        Arc::new(settings),
    )
}
