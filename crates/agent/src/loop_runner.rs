//! The tool-calling loop.
//!
//! One run owns its message sequence and metadata:
//!
//! 1. **Invoking**: send the messages and tool definitions to the model
//! 2. **Inspecting**: no tool calls means **Done**
//! 3. **Dispatching**: run each requested call in order, append a Tool
//!    message per call, record metadata, then go back to 1
//!
//! Tool failures are shown to the model and never end the run. Model
//! failures and the iteration ceiling do.

use std::sync::Arc;

use mcpagent_core::agent::AgentSettings;
use mcpagent_core::message::Message;
use mcpagent_core::metadata::LoopMetadata;
use mcpagent_core::provider::{Provider, ProviderRequest, ToolDefinition, Usage};
use mcpagent_core::tool::ToolResult;
use mcpagent_core::{Error, Result};
use mcpagent_telemetry::{SpanKind, Tracer};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::diagnostics;
use crate::dispatcher::ToolDispatcher;
use crate::stream_event::StreamEvent;

/// Loop states, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Invoking,
    Inspecting,
    Dispatching,
    Done,
}

/// Where tool events go. Blocking calls use [`EventSink::none`].
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<StreamEvent>>,
}

impl EventSink {
    pub fn none() -> Self {
        Self { tx: None }
    }

    pub fn channel(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Send an event, waiting for queue space.
    ///
    /// Fails with [`Error::Cancelled`] once the consumer is gone.
    pub async fn emit(&self, event: StreamEvent) -> Result<()> {
        match &self.tx {
            Some(tx) => tx.send(event).await.map_err(|_| Error::Cancelled),
            None => Ok(()),
        }
    }
}

/// Result of a run that reached `Done`.
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    pub answer: String,
    pub metadata: LoopMetadata,
    /// The whole conversation, ending with the last Tool message (the final
    /// assistant message is not appended)
    pub messages: Vec<Message>,
    /// Model invocations made
    pub iterations: u32,
    pub usage: Usage,
}

/// Drives model invocations and tool dispatch. Cheap to clone.
#[derive(Clone)]
pub struct ToolCallingLoop {
    provider: Arc<dyn Provider>,
    dispatcher: Arc<ToolDispatcher>,
    definitions: Arc<[ToolDefinition]>,
    settings: Arc<AgentSettings>,
    tracer: Tracer,
}

impl ToolCallingLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        dispatcher: Arc<ToolDispatcher>,
        definitions: Vec<ToolDefinition>,
        settings: Arc<AgentSettings>,
    ) -> Self {
        Self {
            provider,
            dispatcher,
            definitions: definitions.into(),
            settings,
            tracer: Tracer::disabled(),
        }
    }

    pub fn with_tracer(mut self, tracer: Tracer) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Run to `Done` starting from `messages`.
    pub async fn run(&self, mut messages: Vec<Message>, sink: &EventSink) -> Result<LoopOutcome> {
        let settings = &self.settings;
        let mut span = self
            .tracer
            .start_span(SpanKind::ToolCallingLoop, &settings.model_id);
        span.attr("max_iterations", settings.max_iterations);

        let mut metadata = LoopMetadata::new();
        let mut usage = Usage::default();
        let mut iteration: u32 = 0;

        info!(
            model = %settings.model_id,
            messages = messages.len(),
            tools = self.definitions.len(),
            "Starting tool-calling loop"
        );

        loop {
            if iteration >= settings.max_iterations {
                warn!(
                    max_iterations = settings.max_iterations,
                    tool_calls = metadata.len(),
                    "Iteration ceiling reached"
                );
                span.fail("iteration ceiling reached");
                return Err(Error::LoopExceeded {
                    max_iterations: settings.max_iterations,
                    metadata,
                });
            }
            iteration += 1;

            debug!(iteration, state = ?LoopState::Invoking, "Agent loop iteration");
            if settings.debug_diagnostics {
                diagnostics::log_history_tail(&messages);
            }

            let request = ProviderRequest {
                model: settings.model_id.clone(),
                messages: messages.clone(),
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                tools: self.definitions.to_vec(),
            };

            let response = {
                let mut llm_span = span.child(SpanKind::LlmInvoke, &settings.model_id);
                llm_span.attr("iteration", iteration);
                match self.provider.complete(request).await {
                    Ok(response) => {
                        if let Some(u) = &response.usage {
                            llm_span.attr("total_tokens", u.total_tokens);
                        }
                        response
                    }
                    Err(source) => {
                        llm_span.fail(source.to_string());
                        span.fail(source.to_string());
                        return Err(Error::ModelInvocation { iteration, source });
                    }
                }
            };
            if let Some(u) = &response.usage {
                usage.add(u);
            }

            debug!(iteration, state = ?LoopState::Inspecting, "Inspecting model response");
            let message = response.message;
            if message.tool_calls().is_empty() {
                debug!(iteration, state = ?LoopState::Done, "Model returned a final answer");
                info!(
                    iterations = iteration,
                    tool_calls = metadata.len(),
                    total_tokens = usage.total_tokens,
                    "Tool-calling loop finished"
                );
                span.attr("iterations", iteration);
                span.attr("tool_calls", metadata.len());
                return Ok(LoopOutcome {
                    answer: message.content().to_string(),
                    metadata,
                    messages,
                    iterations: iteration,
                    usage,
                });
            }

            let calls = message.tool_calls().to_vec();
            messages.push(message);
            debug!(
                iteration,
                state = ?LoopState::Dispatching,
                tool_count = calls.len(),
                "Executing tool calls"
            );
            if settings.debug_diagnostics {
                diagnostics::log_tool_calls(&calls);
            }

            for call in &calls {
                let args = call.arguments_value();
                sink.emit(StreamEvent::ToolCall {
                    tool: call.name.clone(),
                    args: args.clone(),
                })
                .await?;

                let result = {
                    let mut tool_span = span.child(SpanKind::ToolCall, &call.name);
                    tool_span.attr("arguments", args.clone());
                    let result = self.dispatcher.call(&call.name, &call.arguments).await;
                    if let ToolResult::Failure(text) = &result {
                        tool_span.fail(text.clone());
                    }
                    result
                };

                info!(tool = %call.name, success = result.is_success(), "Tool call finished");
                messages.push(Message::tool_result(
                    &call.id,
                    &call.name,
                    result.to_message_content(),
                ));

                let event = match result {
                    ToolResult::Success(payload) => {
                        let payload = payload.to_value();
                        metadata.record_success(&call.name, args.clone(), payload.clone());
                        StreamEvent::ToolResult {
                            tool: call.name.clone(),
                            args,
                            payload,
                        }
                    }
                    ToolResult::Failure(text) => {
                        metadata.record_failure(&call.name, args.clone(), text.clone());
                        StreamEvent::ToolError {
                            tool: call.name.clone(),
                            args,
                            payload: json!({ "error": text }),
                        }
                    }
                };
                sink.emit(event).await?;
            }

            if settings.debug_diagnostics {
                if let Err(problem) = diagnostics::check_tool_linkage(&messages) {
                    warn!(iteration, problem = %problem, "Tool call linkage mismatch");
                }
            }
        }
    }
}
