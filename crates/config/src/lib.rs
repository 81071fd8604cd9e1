//! Configuration loading, validation, and management for mcpagent.
//!
//! Loads configuration from `~/.mcpagent/config.toml` with environment
//! variable overrides, validates it, and turns it into the explicit
//! [`AgentSettings`] handed to an agent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mcpagent_core::AgentSettings;
use serde::{Deserialize, Serialize};

/// The root configuration structure.
///
/// Maps directly to `~/.mcpagent/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tool server connection
    #[serde(default)]
    pub mcp: McpConfig,

    /// Model capability
    #[serde(default)]
    pub model: ModelConfig,

    /// Loop and streaming behavior
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Tool server (MCP) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_mcp_url")]
    pub url: String,

    /// Per-call timeout for the tool transport
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_mcp_url() -> String {
    "http://localhost:6000/mcp".into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: default_mcp_url(),
            timeout_secs: default_timeout_secs(),
            auth: AuthConfig::default(),
        }
    }
}

/// Bearer credentials for tool calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Environment variable the token is read from on every call
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    "MCPAGENT_TOOL_TOKEN".into()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token_env: default_token_env(),
        }
    }
}

/// Model (OpenAI-compatible) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_id")]
    pub model_id: String,

    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model_id() -> String {
    "gpt-4o-mini".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    4000
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            api_url: default_api_url(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Redact secrets in Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("model_id", &self.model_id)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Tool-calling loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// History entries kept per call; 0 keeps everything
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    #[serde(default = "default_true")]
    pub exclude_last: bool,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Emit spans for the loop, model invocations and tool calls
    #[serde(default)]
    pub tracing_enabled: bool,

    #[serde(default)]
    pub debug_diagnostics: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_max_history() -> usize {
    10
}
fn default_true() -> bool {
    true
}
fn default_max_iterations() -> u32 {
    25
}
fn default_event_buffer() -> usize {
    64
}
fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            exclude_last: true,
            max_iterations: default_max_iterations(),
            event_buffer: default_event_buffer(),
            poll_interval_ms: default_poll_interval_ms(),
            tracing_enabled: false,
            debug_diagnostics: false,
            system_prompt: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mcpagent/config.toml).
    ///
    /// Environment variables override the file:
    /// - `MCPAGENT_MCP_URL`
    /// - `MCPAGENT_MODEL`
    /// - `MCPAGENT_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `MCPAGENT_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`load`](Self::load)).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("MCPAGENT_MCP_URL") {
            self.mcp.url = url;
        }
        if let Some(model) = lookup("MCPAGENT_MODEL") {
            self.model.model_id = model;
        }
        if let Some(api_url) = lookup("MCPAGENT_API_URL") {
            self.model.api_url = api_url;
        }
        if let Some(key) = lookup("MCPAGENT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.model.api_key = Some(key);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mcpagent")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.mcp.url.trim().is_empty() {
            return Err(ConfigError::ValidationError("mcp.url must not be empty".into()));
        }
        if self.model.model_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.model_id must not be empty".into(),
            ));
        }
        if self.mcp.timeout_secs == 0 {
            return Err(ConfigError::ValidationError("mcp.timeout_secs must be > 0".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be > 0".into(),
            ));
        }
        if self.agent.event_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "agent.event_buffer must be > 0".into(),
            ));
        }
        if self.agent.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "agent.poll_interval_ms must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
    }

    /// The explicit settings struct for one agent.
    pub fn to_settings(&self) -> AgentSettings {
        AgentSettings {
            model_id: self.model.model_id.clone(),
            temperature: self.model.temperature,
            max_tokens: Some(self.model.max_tokens),
            tool_timeout: Duration::from_secs(self.mcp.timeout_secs),
            max_history: (self.agent.max_history > 0).then_some(self.agent.max_history),
            exclude_last: self.agent.exclude_last,
            max_iterations: self.agent.max_iterations,
            event_buffer: self.agent.event_buffer,
            poll_interval: Duration::from_millis(self.agent.poll_interval_ms),
            system_prompt: self.agent.system_prompt.clone(),
            debug_diagnostics: self.agent.debug_diagnostics,
        }
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for mcpagent_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
