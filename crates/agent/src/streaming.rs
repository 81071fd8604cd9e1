//! Streaming adapter: the loop runs in a background task and reports
//! progress over a bounded channel.
//!
//! The sequence is always `Start`, then one `ToolCall` followed by its
//! `ToolResult`/`ToolError` per dispatched call, then `FinalAnswer`. A fatal
//! error inside the loop is yielded as the last item, after everything that
//! was queued before it.

use std::time::Duration;

use futures::Stream;
use mcpagent_core::message::Message;
use mcpagent_core::{Error, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::loop_runner::{EventSink, ToolCallingLoop};
use crate::stream_event::StreamEvent;

/// Live event sequence of one streaming call.
///
/// Single-pass. Dropping it before `FinalAnswer` aborts the background loop.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<StreamEvent>,
    handle: Option<JoinHandle<Result<()>>>,
    poll_interval: Duration,
}

impl EventStream {
    /// Start `runner` on `messages` in a background task.
    pub fn spawn(runner: ToolCallingLoop, messages: Vec<Message>, question: impl Into<String>) -> Self {
        let settings = runner.settings();
        let (tx, rx) = mpsc::channel(settings.event_buffer.max(1));
        let poll_interval = settings.poll_interval;
        let question = question.into();

        let handle = tokio::spawn(async move {
            let sink = EventSink::channel(tx);
            sink.emit(StreamEvent::Start { question }).await?;
            let outcome = runner.run(messages, &sink).await?;
            sink.emit(StreamEvent::FinalAnswer {
                answer: outcome.answer,
                metadata: outcome.metadata,
            })
            .await
        });

        Self {
            rx,
            handle: Some(handle),
            poll_interval,
        }
    }

    /// Next event, the loop's fatal error, or `None` once finished.
    pub async fn next(&mut self) -> Option<Result<StreamEvent>> {
        loop {
            let handle = self.handle.as_ref()?;
            match tokio::time::timeout(self.poll_interval, self.rx.recv()).await {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => return self.finish().await,
                Err(_) if handle.is_finished() => {
                    return match self.rx.try_recv() {
                        Ok(event) => Some(Ok(event)),
                        Err(_) => self.finish().await,
                    };
                }
                Err(_) => trace!("Waiting for agent loop events"),
            }
        }
    }

    /// Adapt into a [`Stream`].
    pub fn into_stream(self) -> impl Stream<Item = Result<StreamEvent>> + Send {
        futures::stream::unfold(self, |mut events| async move {
            events.next().await.map(|item| (item, events))
        })
    }

    /// Drain everything, stopping at the first error.
    pub async fn collect(mut self) -> Result<Vec<StreamEvent>> {
        let mut events = Vec::new();
        while let Some(item) = self.next().await {
            events.push(item?);
        }
        Ok(events)
    }

    async fn finish(&mut self) -> Option<Result<StreamEvent>> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                debug!(error = %e, "Agent loop ended with an error");
                Some(Err(e))
            }
            Err(e) => Some(Err(Error::Internal(format!("agent loop task failed: {e}")))),
        }
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("Event consumer dropped, aborting agent loop");
            }
            handle.abort();
        }
    }
}
