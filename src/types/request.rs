//! Explanation request as consumed by the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::key::hostname_of;

/// Payload of an `EXPLAIN` message from the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub context: String,
    /// Opaque positioning data, echoed on every response event.
    #[serde(default)]
    pub anchor_rect: Value,
}

/// A single explanation request.
///
/// Created when the page triggers an explanation, consumed once by
/// [`Explainer::explain`](crate::Explainer::explain), never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainRequest {
    pub text: String,
    /// Surrounding page text. Accepted but not part of the prompt.
    pub context: String,
    pub origin_hostname: String,
    pub anchor_rect: Value,
}

impl ExplainRequest {
    /// Build a request for `text` selected on a page served from `hostname`.
    pub fn new(text: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: String::new(),
            origin_hostname: hostname.into(),
            anchor_rect: Value::Null,
        }
    }

    /// Build a request from a page payload and the URL of the sending page.
    pub fn from_payload(payload: ExplainPayload, page_url: Option<&str>) -> Self {
        Self {
            text: payload.text,
            context: payload.context,
            origin_hostname: hostname_of(page_url),
            anchor_rect: payload.anchor_rect,
        }
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn anchor_rect(mut self, anchor_rect: Value) -> Self {
        self.anchor_rect = anchor_rect;
        self
    }
}
