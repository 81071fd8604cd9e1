//! Span tracing for the tool-calling loop.
//!
//! The loop wraps the whole run, each model invocation and each tool call in
//! a span. A [`Tracer`] hands out scoped [`SpanGuard`]s; dropping a guard ends
//! the span and forwards it to a [`SpanSink`]. A disabled tracer hands out
//! no-op guards, so the loop behaves identically with tracing off.

pub mod model;
pub mod tracer;

pub use model::{Span, SpanKind};
pub use tracer::{LogSink, SpanGuard, SpanRecorder, SpanSink, Tracer};
