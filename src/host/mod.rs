//! Native messaging host.
//!
//! The browser starts `clarityd` and exchanges framed JSON over stdin and
//! stdout (see [`framing`]). Each inbound envelope is routed through the
//! [`Relay`]; explanation events are forwarded as they are produced, so
//! several requests may be in flight and their frames interleave. The
//! `requestId` an envelope carries is echoed on every reply to it.

pub mod config;
pub mod framing;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::error::GENERIC_MESSAGE;
use crate::relay::{ControlMessage, ExplainEvent, InboundMessage, MessageSender, Relay, Reply};
use crate::{ClarityError, Result};

use framing::{read_frame, write_frame};

/// Inbound frame contents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Caller-chosen correlation id, echoed verbatim.
    #[serde(default)]
    pub request_id: Option<Value>,
    #[serde(default)]
    pub sender: MessageSender,
    #[serde(flatten)]
    pub message: InboundMessage,
}

/// Outbound frame contents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outbound {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Value>,
    #[serde(flatten)]
    pub body: OutboundBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutboundBody {
    Event(ExplainEvent),
    Control(ControlMessage),
}

/// Reply to a settings frame that could not be read.
pub const INVALID_SETTINGS_MESSAGE: &str = "Invalid settings. Please check your input.";

impl Outbound {
    fn control(request_id: Option<Value>, message: ControlMessage) -> Self {
        Self {
            request_id,
            body: OutboundBody::Control(message),
        }
    }

    fn event(request_id: Option<Value>, event: ExplainEvent) -> Self {
        Self {
            request_id,
            body: OutboundBody::Event(event),
        }
    }

    /// Generic error events to send in place of a terminal event that could
    /// not be written, most specific first.
    fn terminal_fallbacks(&self) -> Vec<Outbound> {
        let OutboundBody::Event(event) = &self.body else {
            return Vec::new();
        };
        if !event.is_terminal() {
            return Vec::new();
        }
        [event.anchor_rect().clone(), Value::Null]
            .into_iter()
            .map(|anchor_rect| {
                Outbound::event(
                    self.request_id.clone(),
                    ExplainEvent::Error {
                        message: GENERIC_MESSAGE.to_string(),
                        anchor_rect,
                    },
                )
            })
            .collect()
    }
}

/// Serve framed messages from `reader` until it closes.
///
/// In-flight explanations run to completion after the reader closes or
/// fails; the writer is returned once every reply has been flushed. A read
/// failure is returned after that drain.
pub async fn serve<R, W>(relay: Relay, mut reader: R, writer: W) -> Result<W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(message) = rx.recv().await {
            let Err(e) = write_frame(&mut writer, &message).await else {
                continue;
            };
            error!(error = %e, request_id = ?message.request_id, "failed to write reply");
            for fallback in message.terminal_fallbacks() {
                match write_frame(&mut writer, &fallback).await {
                    Ok(()) => break,
                    Err(e) => error!(error = %e, "failed to write error reply"),
                }
            }
        }
        writer
    });

    let mut read_error = None;
    loop {
        match read_frame(&mut reader).await {
            Ok(Some(frame)) => handle_frame(&relay, &frame, &tx).await,
            Ok(None) => {
                info!("input closed, draining in-flight requests");
                break;
            }
            Err(e) => {
                error!(error = %e, "failed to read frame, draining in-flight requests");
                read_error = Some(e);
                break;
            }
        }
    }

    drop(tx);
    let writer = writer_task
        .await
        .map_err(|e| ClarityError::Stream(format!("writer task failed: {e}")))?;
    match read_error {
        Some(e) => Err(e),
        None => Ok(writer),
    }
}

async fn handle_frame(relay: &Relay, frame: &[u8], tx: &mpsc::UnboundedSender<Outbound>) {
    let raw: Value = match serde_json::from_slice(frame) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "ignoring frame that is not JSON");
            return;
        }
    };
    let envelope = match Envelope::deserialize(&raw) {
        Ok(envelope) => envelope,
        Err(e) => return reject(relay, &raw, &e, tx).await,
    };
    debug!(request_id = ?envelope.request_id, "message received");

    let reply = relay.dispatch(envelope.message, &envelope.sender).await;
    forward(reply, envelope.request_id, tx);
}

/// Answer a frame whose type is known but whose contents are not, so the
/// caller is never left without a reply.
async fn reject(
    relay: &Relay,
    raw: &Value,
    error: &serde_json::Error,
    tx: &mpsc::UnboundedSender<Outbound>,
) {
    let request_id = raw.get("requestId").cloned();
    match raw.get("type").and_then(Value::as_str) {
        Some("EXPLAIN") => {
            warn!(error = %error, ?request_id, "rejecting malformed explain request");
            let anchor_rect = raw
                .pointer("/payload/anchorRect")
                .cloned()
                .unwrap_or(Value::Null);
            let _ = tx.send(Outbound::control(request_id.clone(), ControlMessage::Ack));
            let _ = tx.send(Outbound::event(
                request_id,
                ExplainEvent::Error {
                    message: GENERIC_MESSAGE.to_string(),
                    anchor_rect,
                },
            ));
        }
        Some("SAVE_SETTINGS") => {
            warn!(error = %error, ?request_id, "rejecting malformed settings");
            let _ = tx.send(Outbound::control(
                request_id,
                ControlMessage::SettingsError {
                    message: INVALID_SETTINGS_MESSAGE.to_string(),
                },
            ));
        }
        // Carries no payload; only the envelope around it was bad.
        Some("GET_STATS") => {
            let reply = relay
                .dispatch(InboundMessage::GetStats, &MessageSender::default())
                .await;
            forward(reply, request_id, tx);
        }
        kind => warn!(error = %error, ?kind, "ignoring unrecognised message"),
    }
}

fn forward(reply: Reply, request_id: Option<Value>, tx: &mpsc::UnboundedSender<Outbound>) {
    match reply {
        Reply::Control(message) => {
            let _ = tx.send(Outbound::control(request_id, message));
        }
        Reply::Events(mut events) => {
            let _ = tx.send(Outbound::control(request_id.clone(), ControlMessage::Ack));
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if tx.send(Outbound::event(request_id.clone(), event)).is_err() {
                        break;
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_with_sender_and_id() {
        let envelope: Envelope = serde_json::from_value(json!({
            "requestId": 7,
            "sender": { "url": "https://example.com/page" },
            "type": "EXPLAIN",
            "payload": { "text": "x", "context": "", "anchorRect": null }
        }))
        .unwrap();
        assert_eq!(envelope.request_id, Some(json!(7)));
        assert_eq!(envelope.sender.url.as_deref(), Some("https://example.com/page"));
        assert!(matches!(envelope.message, InboundMessage::Explain { .. }));
    }

    #[test]
    fn envelope_without_optional_fields() {
        let envelope: Envelope = serde_json::from_value(json!({ "type": "GET_STATS" })).unwrap();
        assert!(envelope.request_id.is_none());
        assert!(envelope.sender.url.is_none());
    }

    #[test]
    fn outbound_flattens_body() {
        let outbound = Outbound {
            request_id: Some(json!("r1")),
            body: OutboundBody::Event(ExplainEvent::Complete {
                text: "done".into(),
                anchor_rect: Value::Null,
            }),
        };
        assert_eq!(
            serde_json::to_value(&outbound).unwrap(),
            json!({
                "requestId": "r1",
                "type": "EXPLANATION_COMPLETE",
                "text": "done",
                "anchorRect": null
            })
        );

        let ack = Outbound {
            request_id: None,
            body: OutboundBody::Control(ControlMessage::Ack),
        };
        assert_eq!(serde_json::to_value(&ack).unwrap(), json!({ "type": "ACK" }));
    }

    #[test]
    fn only_terminal_events_have_fallbacks() {
        let chunk = Outbound::event(
            Some(json!(4)),
            ExplainEvent::Chunk {
                chunk: "a".into(),
                full_text: "a".into(),
                anchor_rect: Value::Null,
            },
        );
        assert!(chunk.terminal_fallbacks().is_empty());
        assert!(Outbound::control(None, ControlMessage::Ack).terminal_fallbacks().is_empty());

        let complete = Outbound::event(
            Some(json!(4)),
            ExplainEvent::Complete {
                text: "long".into(),
                anchor_rect: json!({ "top": 2 }),
            },
        );
        let fallbacks = complete.terminal_fallbacks();
        assert_eq!(fallbacks.len(), 2);
        assert_eq!(
            serde_json::to_value(&fallbacks[0]).unwrap(),
            json!({
                "requestId": 4,
                "type": "EXPLANATION_ERROR",
                "message": GENERIC_MESSAGE,
                "anchorRect": { "top": 2 }
            })
        );
        assert_eq!(
            serde_json::to_value(&fallbacks[1]).unwrap()["anchorRect"],
            Value::Null
        );
    }
}
