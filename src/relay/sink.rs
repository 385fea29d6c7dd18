//! Ordered, single-terminal event delivery for one request.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::trace;

use super::message::ExplainEvent;
use crate::stream::Delta;

/// Receiving end of a request's events.
pub type EventStream = UnboundedReceiverStream<ExplainEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Loading,
    Streaming,
    Done,
}

struct Inner {
    tx: mpsc::UnboundedSender<ExplainEvent>,
    anchor_rect: Value,
    phase: Mutex<Phase>,
}

/// Sending end of a request's events.
///
/// Enforces the event contract by construction: `loading` only as the first
/// event, `chunk` only before the terminal event, and exactly one terminal
/// event. Anything out of order is dropped and reported as `false`. Sending
/// never blocks; a dropped receiver (page navigated away) is not an error.
///
/// Clones share state, so a supervisor holding a clone can still resolve
/// the request if the task driving it dies.
#[derive(Clone)]
pub struct EventSink {
    inner: Arc<Inner>,
}

impl EventSink {
    /// Create a sink/stream pair; every event echoes `anchor_rect`.
    pub fn channel(anchor_rect: Value) -> (Self, EventStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            inner: Arc::new(Inner {
                tx,
                anchor_rect,
                phase: Mutex::new(Phase::Idle),
            }),
        };
        (sink, UnboundedReceiverStream::new(rx))
    }

    /// Emit the pending state, before any network I/O.
    pub fn loading(&self) -> bool {
        self.advance(
            |phase| phase == Phase::Idle,
            Phase::Loading,
            ExplainEvent::Loading {
                anchor_rect: self.anchor(),
            },
        )
    }

    /// Emit one streamed delta.
    pub fn chunk(&self, delta: Delta) -> bool {
        self.advance(
            |phase| phase != Phase::Done,
            Phase::Streaming,
            ExplainEvent::Chunk {
                chunk: delta.text,
                full_text: delta.accumulated,
                anchor_rect: self.anchor(),
            },
        )
    }

    /// Terminal success for a network result.
    pub fn complete(&self, text: impl Into<String>) -> bool {
        self.terminal(ExplainEvent::Complete {
            text: text.into(),
            anchor_rect: self.anchor(),
        })
    }

    /// Terminal success for a cached result.
    pub fn ready(&self, text: impl Into<String>) -> bool {
        self.terminal(ExplainEvent::Ready {
            text: text.into(),
            anchor_rect: self.anchor(),
            is_complete: true,
        })
    }

    /// Terminal failure with a user-facing message.
    pub fn error(&self, message: impl Into<String>) -> bool {
        self.terminal(ExplainEvent::Error {
            message: message.into(),
            anchor_rect: self.anchor(),
        })
    }

    /// Whether a terminal event has been sent.
    pub fn is_finished(&self) -> bool {
        *self.phase() == Phase::Done
    }

    fn terminal(&self, event: ExplainEvent) -> bool {
        self.advance(|phase| phase != Phase::Done, Phase::Done, event)
    }

    fn advance(&self, allowed: impl Fn(Phase) -> bool, next: Phase, event: ExplainEvent) -> bool {
        let mut phase = self.phase();
        if !allowed(*phase) {
            trace!(?phase, ?event, "dropping out-of-order event");
            return false;
        }
        *phase = next;
        // Sent under the lock so concurrent clones cannot reorder events.
        if self.inner.tx.send(event).is_err() {
            trace!("event receiver dropped");
        }
        true
    }

    fn phase(&self) -> std::sync::MutexGuard<'_, Phase> {
        self.inner.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn anchor(&self) -> Value {
        self.inner.anchor_rect.clone()
    }
}
