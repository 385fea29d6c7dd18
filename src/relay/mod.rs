//! Cross-context message relay.
//!
//! The page side sends a request and immediately gets an acknowledgement;
//! the work runs on its own task and its events arrive later on an
//! [`EventStream`]. Each request task is supervised: if it dies without
//! sending a terminal event (a panic), the supervisor sends a generic
//! error so the page is never left waiting.

mod message;
mod sink;

pub use message::{
    ControlMessage, ExplainEvent, InboundMessage, MessageSender, SettingsPayload,
};
pub use sink::{EventSink, EventStream};

use std::sync::Arc;

use tracing::{error, warn};

use crate::error::GENERIC_MESSAGE;
use crate::explain::Explainer;
use crate::store::{Settings, UsageStats};
use crate::types::{ExplainPayload, ExplainRequest};

/// Reply to one inbound message.
pub enum Reply {
    /// An explanation was started; its events follow on the stream.
    Events(EventStream),
    /// A single immediate reply.
    Control(ControlMessage),
}

/// Routes page messages to the explainer and the settings store.
#[derive(Clone)]
pub struct Relay {
    explainer: Arc<Explainer>,
}

impl Relay {
    pub fn new(explainer: Arc<Explainer>) -> Self {
        Self { explainer }
    }

    pub fn explainer(&self) -> &Arc<Explainer> {
        &self.explainer
    }

    /// Handle one inbound message.
    pub async fn dispatch(&self, message: InboundMessage, sender: &MessageSender) -> Reply {
        match message {
            InboundMessage::Explain { payload } => Reply::Events(self.explain(payload, sender)),
            InboundMessage::GetStats => Reply::Control(self.stats().await),
            InboundMessage::SaveSettings { payload } => {
                Reply::Control(self.save_settings(payload).await)
            }
        }
    }

    /// Start an explanation and return its event stream without waiting.
    ///
    /// Must be called within a tokio runtime.
    pub fn explain(&self, payload: ExplainPayload, sender: &MessageSender) -> EventStream {
        let request = ExplainRequest::from_payload(payload, sender.url.as_deref());
        let (sink, events) = EventSink::channel(request.anchor_rect.clone());

        let explainer = Arc::clone(&self.explainer);
        let task_sink = sink.clone();
        let task = tokio::spawn(async move {
            // Errors are already delivered as events.
            let _ = explainer.explain(request, &task_sink).await;
        });

        tokio::spawn(async move {
            if let Err(e) = task.await {
                error!(error = %e, "explanation task aborted");
            }
            if !sink.is_finished() {
                sink.error(GENERIC_MESSAGE);
            }
        });

        events
    }

    async fn stats(&self) -> ControlMessage {
        match UsageStats::load(self.explainer.store().as_ref()).await {
            Ok(stats) => ControlMessage::Stats(stats),
            Err(e) => {
                warn!(error = %e, "failed to load usage stats");
                ControlMessage::Stats(UsageStats::default())
            }
        }
    }

    async fn save_settings(&self, payload: SettingsPayload) -> ControlMessage {
        let settings = Settings {
            gemini_key: Some(payload.gemini_key),
            detail_level: payload.detail_level,
            theme: payload.theme,
        };
        match settings.save(self.explainer.store().as_ref()).await {
            Ok(()) => ControlMessage::SettingsSaved,
            Err(e) => ControlMessage::SettingsError {
                message: e.user_message(),
            },
        }
    }
}
