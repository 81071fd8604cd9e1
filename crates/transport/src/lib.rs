//! Tool transports for mcpagent.
//!
//! [`McpHttpTransport`] speaks the MCP "streamable HTTP" JSON-RPC subset the
//! agent needs: `initialize`, `tools/list` and `tools/call`. Every operation
//! runs in its own short-lived session. Credential suppliers live in
//! [`credentials`].

pub mod credentials;
pub mod http;
pub mod protocol;

pub use credentials::{EnvToken, NoCredentials, StaticToken};
pub use http::McpHttpTransport;
