//! # mcpagent core
//!
//! Domain types, traits, and error definitions for the mcpagent tool-calling
//! runtime. This crate does no I/O; it defines the model that the transport,
//! provider, and agent crates implement against.
//!
//! ## Seams
//!
//! The two external collaborators of the agent are defined as traits here:
//! - [`Provider`]: the model capability (invoke / stream)
//! - [`ToolTransport`]: the tool source (list tools / call tool)
//!
//! plus [`CredentialSupplier`] for per-call bearer tokens.

pub mod agent;
pub mod error;
pub mod message;
pub mod metadata;
pub mod provider;
pub mod tool;
pub mod transport;

// Re-export key types at crate root for ergonomics
pub use agent::AgentSettings;
pub use error::{Error, Result};
pub use message::{HistoryEntry, HistoryRole, Message, ToolCallRequest};
pub use metadata::LoopMetadata;
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition, Usage};
pub use tool::{ParameterSchema, PropertySchema, ToolDescriptor, ToolPayload, ToolResult};
pub use transport::{CallOutput, CredentialSupplier, RawToolEntry, ToolTransport};
