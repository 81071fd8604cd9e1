//! Aggregated record of every tool invoked during one loop run.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Three index-aligned sequences, one entry per tool call.
///
/// Fields are private so the only way to grow the record is through
/// [`record_success`](Self::record_success) / [`record_failure`](Self::record_failure),
/// which keep the three sequences the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopMetadata {
    tool_names: Vec<String>,
    tool_params: Vec<Value>,
    tool_results: Vec<Value>,
    /// Indexes recorded through `record_failure`. Not serialized.
    #[serde(skip)]
    failures: Vec<usize>,
}

impl LoopMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call and its payload.
    pub fn record_success(&mut self, name: impl Into<String>, params: Value, payload: Value) {
        self.push(name.into(), params, payload);
    }

    /// Record a failed call as `{"error": text}`.
    pub fn record_failure(&mut self, name: impl Into<String>, params: Value, error: impl Into<String>) {
        self.failures.push(self.tool_names.len());
        self.push(
            name.into(),
            params,
            serde_json::json!({ "error": error.into() }),
        );
    }

    fn push(&mut self, name: String, params: Value, result: Value) {
        self.tool_names.push(name);
        self.tool_params.push(params);
        self.tool_results.push(result);
        debug_assert!(self.is_aligned());
    }

    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    pub fn tool_params(&self) -> &[Value] {
        &self.tool_params
    }

    pub fn tool_results(&self) -> &[Value] {
        &self.tool_results
    }

    /// Number of tool calls recorded.
    pub fn len(&self) -> usize {
        self.tool_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tool_names.is_empty()
    }

    /// All three sequences have the same length.
    pub fn is_aligned(&self) -> bool {
        self.tool_names.len() == self.tool_params.len()
            && self.tool_params.len() == self.tool_results.len()
    }

    /// Iterate `(name, params, result)` triples in call order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value, &Value)> {
        self.tool_names
            .iter()
            .zip(&self.tool_params)
            .zip(&self.tool_results)
            .map(|((n, p), r)| (n.as_str(), p, r))
    }

    /// Whether the entry at `index` was recorded with
    /// [`record_failure`](Self::record_failure). A successful payload that
    /// happens to look like `{"error": ...}` is not a failure.
    pub fn is_failure(&self, index: usize) -> bool {
        self.failures.contains(&index)
    }
}
