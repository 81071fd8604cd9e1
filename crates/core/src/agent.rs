//! Per-agent settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Explicit configuration passed into the agent facade.
///
/// Several agents with different settings can coexist in one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model to invoke
    pub model_id: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per tool-transport call timeout
    #[serde(default = "default_tool_timeout", with = "duration_secs")]
    pub tool_timeout: Duration,

    /// Keep only the last N history entries (`None` = keep all)
    #[serde(default = "default_max_history")]
    pub max_history: Option<usize>,

    /// Drop the last history entry (already represented by the question)
    #[serde(default = "default_true")]
    pub exclude_last: bool,

    /// Safety ceiling on model invocations per call
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Bounded event channel capacity for streaming calls
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,

    /// How long the streaming consumer waits before re-checking the producer
    #[serde(default = "default_poll_interval", with = "duration_millis")]
    pub poll_interval: Duration,

    /// Replace the default system prompt template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Log bound schemas, history tails and tool-call linkage
    #[serde(default)]
    pub debug_diagnostics: bool,
}

fn default_temperature() -> f32 {
    0.1
}
fn default_tool_timeout() -> Duration {
    Duration::from_secs(60)
}
fn default_max_history() -> Option<usize> {
    Some(10)
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
fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

impl AgentSettings {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Self::default()
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_max_history(mut self, max: Option<usize>) -> Self {
        self.max_history = max;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model_id: "gpt-4o-mini".into(),
            temperature: default_temperature(),
            max_tokens: Some(4000),
            tool_timeout: default_tool_timeout(),
            max_history: default_max_history(),
            exclude_last: true,
            max_iterations: default_max_iterations(),
            event_buffer: default_event_buffer(),
            poll_interval: default_poll_interval(),
            system_prompt: None,
            debug_diagnostics: false,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let settings = AgentSettings::default();
        assert_eq!(settings.max_history, Some(10));
        assert_eq!(settings.tool_timeout, Duration::from_secs(60));
        assert_eq!(settings.max_iterations, 25);
        assert!(settings.exclude_last);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: AgentSettings =
            serde_json::from_str(r#"{"model_id":"m","tool_timeout":5,"poll_interval":20}"#).unwrap();
        assert_eq!(settings.model_id, "m");
        assert_eq!(settings.tool_timeout, Duration::from_secs(5));
        assert_eq!(settings.poll_interval, Duration::from_millis(20));
        assert_eq!(settings.event_buffer, 64);
    }

    #[test]
    fn builder_methods() {
        let settings = AgentSettings::new("m")
            .with_max_iterations(3)
            .with_max_history(None);
        assert_eq!(settings.max_iterations, 3);
        assert!(settings.max_history.is_none());
    }
}
