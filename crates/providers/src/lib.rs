//! Model provider implementations for mcpagent.
//!
//! All providers implement the `mcpagent_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
