//! Error types for the mcpagent domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is what crosses the
//! public API of the agent.
//!
//! Propagation policy:
//! - [`ToolError`] / [`AuthError`] raised for a single tool call are recovered
//!   inside the loop and shown to the model as a Tool message.
//! - [`ProviderError`], [`DiscoveryError`], [`BindingError`] and an exceeded
//!   iteration ceiling are fatal to the call (or to agent creation).

use std::time::Duration;

use thiserror::Error;

use crate::metadata::LoopMetadata;

/// The top-level error type for all mcpagent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Agent creation ---
    #[error("Tool discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Tool binding failed: {0}")]
    Binding(#[from] BindingError),

    #[error("Agent initialization failed during {stage}: {source}")]
    Initialization {
        stage: &'static str,
        #[source]
        source: Box<Error>,
    },

    // --- Per-call ---
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Tool dispatch failed: {0}")]
    ToolDispatch(#[from] ToolError),

    #[error("Model invocation failed at iteration {iteration}: {source}")]
    ModelInvocation {
        iteration: u32,
        #[source]
        source: ProviderError,
    },

    #[error("Tool-calling loop exceeded {max_iterations} iterations ({} tool calls made)", .metadata.len())]
    LoopExceeded {
        max_iterations: u32,
        metadata: LoopMetadata,
    },

    #[error("Operation cancelled: the event consumer went away")]
    Cancelled,

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a creation sub-step failure.
    pub fn initialization(stage: &'static str, source: impl Into<Error>) -> Self {
        Self::Initialization {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// Whether this error ends the current `answer` call.
    ///
    /// Tool-level errors are normally absorbed by the loop and never reach a
    /// caller; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ToolDispatch(_) | Self::Auth(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Catalog fetch/parse failure. Fatal to agent creation.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("Tool transport unreachable at {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("Malformed catalog entry #{index}: {reason}")]
    MalformedEntry { index: usize, reason: String },

    #[error("Duplicate tool name in catalog: {0}")]
    DuplicateTool(String),
}

/// Schema-to-binding conversion failure. Fatal to agent creation.
#[derive(Debug, Clone, Error)]
pub enum BindingError {
    #[error("Tool '{tool}' requires arguments but declares no properties")]
    NoProperties { tool: String },

    #[error("Tool '{tool}' requires '{property}' but declares no such property")]
    UndeclaredRequired { tool: String, property: String },
}

/// Credential acquisition failure. Fatal to the one call that needed it.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Credential unavailable: {0}")]
    Unavailable(String),

    #[error("Credential supplier failed: {0}")]
    SupplierFailed(String),

    #[error("Credential rejected by tool transport: {0}")]
    Rejected(String),
}

/// Model capability failure.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Tool-transport failure (network, protocol, remote error).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl TransportError {
    /// Timeout after `limit`, kept to the millisecond.
    pub fn timeout(limit: Duration) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A single tool invocation failed. Recovered locally by the loop.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("Tool {tool_name} timed out after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Tool {tool_name} failed: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool {tool_name} could not authenticate: {source}")]
    Auth {
        tool_name: String,
        #[source]
        source: AuthError,
    },

    #[error("Tool {tool_name} transport failure: {source}")]
    Transport {
        tool_name: String,
        #[source]
        source: TransportError,
    },
}
