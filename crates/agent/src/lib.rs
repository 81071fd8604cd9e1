//! The tool-calling agent.
//!
//! An [`Agent`] is created against one tool server and one model:
//!
//! 1. **Discover** the tool catalog through a [`ToolTransport`](mcpagent_core::transport::ToolTransport)
//! 2. **Bind** every tool schema into typed parameter descriptors
//! 3. **Answer** each question by building `[System, ...history, User]` and
//!    running the tool-calling loop: invoke the model, dispatch the tools it
//!    asks for, feed the results back, until it answers in plain text
//!
//! [`Agent::answer_streaming`] runs the same loop in a background task and
//! reports each step as a [`StreamEvent`].

pub mod binding;
pub mod catalog;
pub mod diagnostics;
pub mod dispatcher;
pub mod facade;
pub mod loop_runner;
pub mod messages;
pub mod stream_event;
pub mod streaming;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use binding::{BoundTool, ParamKind, ParameterDescriptor};
pub use dispatcher::ToolDispatcher;
pub use facade::{Agent, AgentAnswer};
pub use loop_runner::{EventSink, LoopOutcome, LoopState, ToolCallingLoop};
pub use messages::{DEFAULT_SYSTEM_PROMPT, build_messages, render_system_prompt};
pub use stream_event::StreamEvent;
pub use streaming::EventStream;
