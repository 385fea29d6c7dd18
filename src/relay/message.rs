//! Messages exchanged between the page and the background pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::UsageStats;
use crate::types::{DetailLevel, ExplainPayload, Theme};

/// Identity of the page that sent a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    /// URL of the sending tab, if any.
    #[serde(default)]
    pub url: Option<String>,
}

impl MessageSender {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

/// Request from the page side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundMessage {
    /// Explain the selected text.
    Explain { payload: ExplainPayload },
    /// Read the usage counters.
    GetStats,
    /// Validate and store new settings.
    SaveSettings { payload: SettingsPayload },
}

/// Settings form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPayload {
    #[serde(default)]
    pub gemini_key: String,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub theme: Theme,
}

/// Event delivered for one explanation request.
///
/// Per request the sequence is: at most one `Loading`, zero or more `Chunk`
/// with growing `full_text`, then exactly one terminal event (`Complete`,
/// `Ready` or `Error`). Cache hits go straight to `Ready`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ExplainEvent {
    #[serde(rename = "EXPLANATION_LOADING")]
    Loading { anchor_rect: Value },

    #[serde(rename = "EXPLANATION_CHUNK")]
    Chunk {
        chunk: String,
        full_text: String,
        anchor_rect: Value,
    },

    /// Network result, after loading/chunks.
    #[serde(rename = "EXPLANATION_COMPLETE")]
    Complete { text: String, anchor_rect: Value },

    /// Cached result, delivered without loading/chunks.
    #[serde(rename = "EXPLANATION_READY")]
    Ready {
        text: String,
        anchor_rect: Value,
        is_complete: bool,
    },

    #[serde(rename = "EXPLANATION_ERROR")]
    Error { message: String, anchor_rect: Value },
}

impl ExplainEvent {
    /// Whether no further events follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExplainEvent::Complete { .. } | ExplainEvent::Ready { .. } | ExplainEvent::Error { .. }
        )
    }

    /// Positioning payload echoed from the request.
    pub fn anchor_rect(&self) -> &Value {
        match self {
            ExplainEvent::Loading { anchor_rect }
            | ExplainEvent::Chunk { anchor_rect, .. }
            | ExplainEvent::Complete { anchor_rect, .. }
            | ExplainEvent::Ready { anchor_rect, .. }
            | ExplainEvent::Error { anchor_rect, .. } => anchor_rect,
        }
    }

    /// Final text of a successful terminal event.
    pub fn text(&self) -> Option<&str> {
        match self {
            ExplainEvent::Complete { text, .. } | ExplainEvent::Ready { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Replies that are not part of an explanation event sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum ControlMessage {
    /// The request was accepted; its events follow asynchronously.
    Ack,
    Stats(UsageStats),
    SettingsSaved,
    SettingsError { message: String },
}
