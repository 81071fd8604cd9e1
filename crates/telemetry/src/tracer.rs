//! Scoped span handles and sinks.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use crate::model::{Span, SpanKind};

/// Receives finished spans.
pub trait SpanSink: Send + Sync {
    fn record(&self, span: Span);
}

/// Forwards finished spans to the `tracing` subscriber at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SpanSink for LogSink {
    fn record(&self, span: Span) {
        debug!(
            span_kind = %span.kind,
            label = %span.label,
            duration_ms = span.duration_ms.unwrap_or(0),
            success = span.success.unwrap_or(false),
            error = span.error.as_deref().unwrap_or(""),
            "Span finished"
        );
    }
}

/// Keeps finished spans in memory.
#[derive(Debug, Default)]
pub struct SpanRecorder {
    spans: Mutex<Vec<Span>>,
}

impl SpanRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of spans recorded so far, in finish order.
    pub fn spans(&self) -> Vec<Span> {
        self.spans.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn spans_of(&self, kind: SpanKind) -> Vec<Span> {
        self.spans().into_iter().filter(|s| s.kind == kind).collect()
    }
}

impl SpanSink for SpanRecorder {
    fn record(&self, span: Span) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.push(span);
        }
    }
}

/// Hands out span guards. Cheap to clone.
///
/// A disabled tracer produces inert guards: attributes are discarded and
/// nothing is recorded.
#[derive(Clone, Default)]
pub struct Tracer {
    sink: Option<Arc<dyn SpanSink>>,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Tracer {
    pub fn new(sink: Arc<dyn SpanSink>) -> Self {
        Self { sink: Some(sink) }
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// A tracer that logs spans through `tracing`.
    pub fn logging() -> Self {
        Self::new(Arc::new(LogSink))
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Open a root span.
    pub fn start_span(&self, kind: SpanKind, label: impl Into<String>) -> SpanGuard {
        SpanGuard::open(self.sink.clone(), Span::new(kind, label))
    }
}

/// An open span. Ends and records the span when dropped.
///
/// The span counts as successful unless [`fail`](Self::fail) was called.
pub struct SpanGuard {
    sink: Option<Arc<dyn SpanSink>>,
    span: Option<Span>,
}

impl SpanGuard {
    fn open(sink: Option<Arc<dyn SpanSink>>, span: Span) -> Self {
        let span = sink.as_ref().map(|_| span);
        Self { sink, span }
    }

    /// Attach an attribute. No-op on a disabled tracer.
    pub fn attr(&mut self, key: &str, value: impl Into<Value>) {
        if let Some(span) = self.span.as_mut() {
            span.attributes.insert(key.to_string(), value.into());
        }
    }

    /// Mark the span failed with the given error text.
    pub fn fail(&mut self, error: impl Into<String>) {
        if let Some(span) = self.span.as_mut() {
            span.error = Some(error.into());
            span.success = Some(false);
        }
    }

    /// Open a span nested under this one.
    pub fn child(&self, kind: SpanKind, label: impl Into<String>) -> SpanGuard {
        let mut span = Span::new(kind, label);
        if let Some(parent) = self.span.as_ref() {
            span = span.with_parent(parent.id.clone());
        }
        SpanGuard::open(self.sink.clone(), span)
    }

    pub fn id(&self) -> Option<&str> {
        self.span.as_ref().map(|s| s.id.as_str())
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        if let (Some(sink), Some(mut span)) = (self.sink.as_ref(), self.span.take()) {
            let success = span.error.is_none();
            span.end(success);
            sink.record(span);
        }
    }
}
