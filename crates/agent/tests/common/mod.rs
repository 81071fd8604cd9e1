//! Scripted collaborators for the agent integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mcpagent_core::error::{AuthError, ProviderError, TransportError};
use mcpagent_core::message::{Message, ToolCallRequest};
use mcpagent_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use mcpagent_core::transport::{CallOutput, CredentialSupplier, RawToolEntry, ToolTransport};
use serde_json::{Map, Value, json};

/// Plays back model turns in order; every request is kept for inspection.
pub struct ScriptedModel {
    turns: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    pub requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl ScriptedModel {
    pub fn new(turns: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// One round of `lookup` calls, then a text answer.
    pub fn lookup_then(cities: &[&str], answer: &str) -> Self {
        let calls = cities
            .iter()
            .enumerate()
            .map(|(i, city)| lookup_call(&format!("call_{i}"), city))
            .collect();
        Self::new(vec![Ok(calls_turn(calls)), Ok(text_turn(answer))])
    }
}

#[async_trait]
impl Provider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::MalformedResponse("script exhausted".into())))
    }
}

pub fn text_turn(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 20,
            completion_tokens: 8,
            total_tokens: 28,
        }),
        model: "scripted".into(),
    }
}

pub fn calls_turn(calls: Vec<ToolCallRequest>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_calls("", calls),
        usage: None,
        model: "scripted".into(),
    }
}

pub fn lookup_call(id: &str, city: &str) -> ToolCallRequest {
    let mut args = Map::new();
    args.insert("city".into(), json!(city));
    ToolCallRequest::new(id, "lookup", args)
}

type Behavior = Arc<dyn Fn(&Map<String, Value>) -> Result<CallOutput, TransportError> + Send + Sync>;

/// A one-tool server offering `lookup(city: string, required)`.
pub struct WeatherServer {
    behavior: Behavior,
    pub calls: Arc<Mutex<Vec<Map<String, Value>>>>,
    pub tokens: Arc<Mutex<Vec<Option<String>>>>,
    extra_entries: Vec<RawToolEntry>,
    delay: Option<Duration>,
}

impl WeatherServer {
    /// Answers "22C" for every city.
    pub fn sunny() -> Self {
        Self::with_behavior(|_| Ok(CallOutput::text("22C")))
    }

    /// Every call times out.
    pub fn timing_out() -> Self {
        Self::with_behavior(|_| Err(TransportError::Timeout { timeout_ms: 60_000 }))
    }

    pub fn with_behavior(
        behavior: impl Fn(&Map<String, Value>) -> Result<CallOutput, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            behavior: Arc::new(behavior),
            calls: Arc::new(Mutex::new(Vec::new())),
            tokens: Arc::new(Mutex::new(Vec::new())),
            extra_entries: Vec::new(),
            delay: None,
        }
    }

    pub fn with_entry(mut self, entry: RawToolEntry) -> Self {
        self.extra_entries.push(entry);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

pub fn lookup_entry() -> RawToolEntry {
    RawToolEntry {
        name: Some("lookup".into()),
        description: Some("Current weather for a city".into()),
        input_schema: Some(json!({
            "type": "object",
            "properties": {"city": {"type": "string", "title": "City"}},
            "required": ["city"]
        })),
    }
}

#[async_trait]
impl ToolTransport for WeatherServer {
    fn endpoint(&self) -> &str {
        "memory://weather"
    }

    async fn list_tools(&self, credential: Option<&str>) -> Result<Vec<RawToolEntry>, TransportError> {
        self.tokens.lock().unwrap().push(credential.map(String::from));
        let mut entries = vec![lookup_entry()];
        entries.extend(self.extra_entries.iter().cloned());
        Ok(entries)
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        credential: Option<&str>,
        timeout: Duration,
    ) -> Result<CallOutput, TransportError> {
        self.tokens.lock().unwrap().push(credential.map(String::from));
        self.calls.lock().unwrap().push(arguments.clone());
        if let Some(delay) = self.delay {
            tokio::time::timeout(timeout, tokio::time::sleep(delay))
                .await
                .map_err(|_| TransportError::timeout(timeout))?;
        }
        if name != "lookup" {
            return Err(TransportError::Rpc {
                code: -32602,
                message: format!("unknown tool {name}"),
            });
        }
        (self.behavior)(arguments)
    }
}

/// Hands out a fixed token, or fails once `fail_after` tokens were issued.
pub struct CountingTokens {
    issued: Mutex<usize>,
    fail_after: Option<usize>,
}

impl CountingTokens {
    pub fn unlimited() -> Self {
        Self {
            issued: Mutex::new(0),
            fail_after: None,
        }
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            issued: Mutex::new(0),
            fail_after: Some(n),
        }
    }
}

#[async_trait]
impl CredentialSupplier for CountingTokens {
    async fn credential(&self) -> Result<Option<String>, AuthError> {
        let mut issued = self.issued.lock().unwrap();
        if self.fail_after.is_some_and(|limit| *issued >= limit) {
            return Err(AuthError::SupplierFailed("token endpoint down".into()));
        }
        *issued += 1;
        Ok(Some(format!("token-{issued}")))
    }
}
