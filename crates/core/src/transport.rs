//! Tool transport and credential traits: the agent's view of a tool server.
//!
//! The agent never talks to a tool directly: it lists the catalog once and
//! calls tools by name through a [`ToolTransport`]. Credentials are fetched
//! per call from a [`CredentialSupplier`].

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AuthError, TransportError};

/// A catalog entry as the transport reports it, before normalization.
///
/// Every field is optional because tool servers are heterogeneous; the
/// catalog adapter decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawToolEntry {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<Value>,
}

/// What a tool server returned for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOutput {
    /// Structured data field, if the server sent one
    pub structured: Option<Value>,

    /// Concatenated textual content, if any
    pub text: Option<String>,

    /// The whole response, for the string-representation fallback
    pub raw: Value,

    /// The server flagged the call as failed
    pub is_error: bool,
}

impl CallOutput {
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: Value::String(text.clone()),
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn structured(value: Value) -> Self {
        Self {
            raw: value.clone(),
            structured: Some(value),
            ..Self::default()
        }
    }
}

/// The tool-transport capability.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Where this transport points (for logs and errors).
    fn endpoint(&self) -> &str;

    /// Fetch the tool catalog.
    async fn list_tools(
        &self,
        credential: Option<&str>,
    ) -> std::result::Result<Vec<RawToolEntry>, TransportError>;

    /// Call a tool by name.
    async fn call_tool(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
        credential: Option<&str>,
        timeout: Duration,
    ) -> std::result::Result<CallOutput, TransportError>;
}

/// Supplies a short-lived bearer token per call; `None` when auth is disabled.
#[async_trait]
pub trait CredentialSupplier: Send + Sync {
    async fn credential(&self) -> std::result::Result<Option<String>, AuthError>;
}
