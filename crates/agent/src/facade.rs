//! The agent facade: discovery and binding at creation, then `answer`
//! and `answer_streaming` per question.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::{Stream, StreamExt};
use mcpagent_config::AppConfig;
use mcpagent_core::agent::AgentSettings;
use mcpagent_core::message::{HistoryEntry, Message};
use mcpagent_core::metadata::LoopMetadata;
use mcpagent_core::provider::{Provider, ProviderRequest, ToolDefinition};
use mcpagent_core::tool::ToolDescriptor;
use mcpagent_core::transport::{CredentialSupplier, ToolTransport};
use mcpagent_core::{Error, Result};
use mcpagent_providers::OpenAiCompatProvider;
use mcpagent_telemetry::Tracer;
use mcpagent_transport::{EnvToken, McpHttpTransport, NoCredentials};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::binding::{self, BoundTool};
use crate::catalog;
use crate::diagnostics;
use crate::dispatcher::ToolDispatcher;
use crate::loop_runner::{EventSink, LoopOutcome, ToolCallingLoop};
use crate::messages;
use crate::streaming::EventStream;

/// Result of a blocking `answer` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAnswer {
    pub answer: String,
    pub metadata: LoopMetadata,
}

/// A tool-calling agent bound to one tool server and one model.
///
/// Cheap to clone; concurrent calls each run their own loop.
#[derive(Clone)]
pub struct Agent {
    inner: Arc<AgentInner>,
}

struct AgentInner {
    tools: Vec<ToolDescriptor>,
    bound: Vec<BoundTool>,
    definitions: Vec<ToolDefinition>,
    provider: Arc<dyn Provider>,
    runner: ToolCallingLoop,
    settings: Arc<AgentSettings>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("provider", &self.inner.provider.name())
            .field("model", &self.inner.settings.model_id)
            .field("tools", &self.inner.definitions.len())
            .finish()
    }
}

impl Agent {
    /// Discover the catalog, bind it and wire up the loop.
    ///
    /// Fails with [`Error::Initialization`] naming the step that failed.
    pub async fn create(
        transport: Arc<dyn ToolTransport>,
        credentials: Arc<dyn CredentialSupplier>,
        provider: Arc<dyn Provider>,
        settings: AgentSettings,
    ) -> Result<Self> {
        Self::create_traced(transport, credentials, provider, settings, Tracer::disabled()).await
    }

    /// Like [`create`](Self::create), recording spans through `tracer`.
    pub async fn create_traced(
        transport: Arc<dyn ToolTransport>,
        credentials: Arc<dyn CredentialSupplier>,
        provider: Arc<dyn Provider>,
        settings: AgentSettings,
        tracer: Tracer,
    ) -> Result<Self> {
        let tools = catalog::discover(transport.as_ref(), credentials.as_ref())
            .await
            .map_err(|e| Error::initialization("discovery", e))?;
        let bound = binding::bind_all(&tools).map_err(|e| Error::initialization("binding", e))?;

        if settings.debug_diagnostics {
            diagnostics::log_bound_tools(&bound);
        }

        let definitions: Vec<ToolDefinition> = bound.iter().map(BoundTool::to_definition).collect();
        let settings = Arc::new(settings);
        let dispatcher = ToolDispatcher::new(transport, credentials, bound.clone(), settings.tool_timeout);
        let runner = ToolCallingLoop::new(
            provider.clone(),
            Arc::new(dispatcher),
            definitions.clone(),
            settings.clone(),
        )
        .with_tracer(tracer);

        info!(
            provider = provider.name(),
            model = %settings.model_id,
            tools = definitions.len(),
            "Agent ready"
        );

        Ok(Self {
            inner: Arc::new(AgentInner {
                tools,
                bound,
                definitions,
                provider,
                runner,
                settings,
            }),
        })
    }

    /// Create an agent for an MCP endpoint over streamable HTTP.
    pub async fn connect(
        endpoint: &str,
        credentials: Arc<dyn CredentialSupplier>,
        provider: Arc<dyn Provider>,
        settings: AgentSettings,
    ) -> Result<Self> {
        let transport = McpHttpTransport::new(endpoint).with_discovery_timeout(settings.tool_timeout);
        Self::create(Arc::new(transport), credentials, provider, settings).await
    }

    /// Build every collaborator from a loaded configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let settings = config.to_settings();

        let transport = McpHttpTransport::new(&config.mcp.url)
            .with_discovery_timeout(Duration::from_secs(config.mcp.timeout_secs));
        let credentials: Arc<dyn CredentialSupplier> = if config.mcp.auth.enabled {
            Arc::new(EnvToken::new(&config.mcp.auth.token_env))
        } else {
            Arc::new(NoCredentials)
        };
        let provider = OpenAiCompatProvider::new(
            "openai-compat",
            &config.model.api_url,
            config.model.api_key.clone().unwrap_or_default(),
        );
        let tracer = if config.agent.tracing_enabled {
            Tracer::logging()
        } else {
            Tracer::disabled()
        };

        Self::create_traced(Arc::new(transport), credentials, Arc::new(provider), settings, tracer).await
    }

    /// Answer a question, running tools as the model requests them.
    pub async fn answer(&self, question: &str, history: &[HistoryEntry]) -> Result<AgentAnswer> {
        let outcome = self.run_loop(question, history).await?;
        Ok(AgentAnswer {
            answer: outcome.answer,
            metadata: outcome.metadata,
        })
    }

    /// Like [`answer`](Self::answer) but with the full loop outcome
    /// (conversation, iteration count, token usage).
    pub async fn run_loop(&self, question: &str, history: &[HistoryEntry]) -> Result<LoopOutcome> {
        let messages = self.build_messages(question, history);
        self.inner.runner.run(messages, &EventSink::none()).await
    }

    /// Answer a question while reporting progress as [`StreamEvent`](crate::StreamEvent)s.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn answer_streaming(&self, question: &str, history: &[HistoryEntry]) -> EventStream {
        let messages = self.build_messages(question, history);
        EventStream::spawn(self.inner.runner.clone(), messages, question)
    }

    /// Stream the model's text for `messages`, without tools.
    pub async fn stream_text(
        &self,
        messages: Vec<Message>,
    ) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
        let settings = &self.inner.settings;
        let request = ProviderRequest {
            model: settings.model_id.clone(),
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            tools: Vec::new(),
        };
        let rx = self
            .inner
            .provider
            .stream(request)
            .await
            .map_err(|source| Error::ModelInvocation { iteration: 1, source })?;

        Ok(ReceiverStream::new(rx).filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => chunk.content.filter(|text| !text.is_empty()).map(Ok),
                Err(source) => Some(Err(Error::ModelInvocation { iteration: 1, source })),
            }
        }))
    }

    /// Stream a final answer written from a finished loop's tool results.
    pub async fn stream_answer_from_tools(
        &self,
        question: &str,
        metadata: &LoopMetadata,
    ) -> Result<impl Stream<Item = Result<String>> + Send + use<>> {
        let messages = messages::final_answer_messages(&self.system_prompt(), question, metadata);
        self.stream_text(messages).await
    }

    /// Descriptors discovered at creation.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.inner.tools
    }

    pub fn bound_tools(&self) -> &[BoundTool] {
        &self.inner.bound
    }

    /// Model-facing definitions.
    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.inner.definitions
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.inner.settings
    }

    fn system_prompt(&self) -> String {
        messages::render_system_prompt(self.inner.settings.system_prompt.as_deref(), Local::now())
    }

    fn build_messages(&self, question: &str, history: &[HistoryEntry]) -> Vec<Message> {
        let settings = &self.inner.settings;
        messages::build_messages(
            history,
            &self.system_prompt(),
            question,
            settings.max_history,
            settings.exclude_last,
        )
    }
}
