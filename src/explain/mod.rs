//! Explanation request orchestration.
//!
//! [`Explainer`] drives one request through its state machine:
//!
//! ```text
//! RECEIVED ─┬─ empty text ─────────────────────────────► error
//!           ├─ no API key ─────────────────────────────► error
//!           ├─ cache hit ──────────────────────────────► ready
//!           └─ LOADING ─► STREAMING ─┬─ text ──────────► complete
//!                                    ├─ empty  ─┐
//!                                    └─ failed ─┴─► SINGLE-SHOT ─┬─► complete
//!                                                                └─► error
//! ```
//!
//! Network generation is a fixed two-attempt policy: a streaming call
//! first, then one single-shot call if the stream failed or produced only
//! whitespace. There is no backoff loop. Every success (cache hit or
//! network result) records exactly one usage-stats update; errors record
//! none.

mod builder;

pub use builder::{Clarity, ClarityBuilder};

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tracing::{debug, info, instrument, warn};

use crate::cache::{ExplanationCache, derive_key};
use crate::prompt::build_prompt;
use crate::providers::ExplanationProvider;
use crate::relay::EventSink;
use crate::store::settings::now_millis;
use crate::store::{KeyValueStore, Settings, UsageStats};
use crate::stream::StreamExtractor;
use crate::telemetry;
use crate::types::ExplainRequest;
use crate::{ClarityError, Result};

/// Message for requests whose selection is blank.
pub const NO_TEXT_MESSAGE: &str = "No text provided for explanation";

/// Why the single-shot attempt ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The streaming call failed (transport, HTTP status or mid-stream).
    StreamFailed,
    /// The stream completed with empty or whitespace-only text.
    StreamEmpty,
}

impl FallbackReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackReason::StreamFailed => "stream_error",
            FallbackReason::StreamEmpty => "stream_empty",
        }
    }
}

/// How a successful request was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache without network I/O.
    Cached(String),
    /// Produced by the streaming call.
    Streamed(String),
    /// Produced by the single-shot call after the stream did not deliver.
    Fallback { text: String, reason: FallbackReason },
}

impl Outcome {
    pub fn text(&self) -> &str {
        match self {
            Outcome::Cached(text) | Outcome::Streamed(text) => text,
            Outcome::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Outcome::Cached(text) | Outcome::Streamed(text) => text,
            Outcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Outcome::Cached(_))
    }
}

/// Orchestrates explanation requests.
///
/// Owns the process-wide [`ExplanationCache`] and serialises usage-stats
/// updates. Share it behind an `Arc`; concurrent requests are independent
/// and identical in-flight requests are not coalesced (last cache write
/// wins).
pub struct Explainer {
    provider: Arc<dyn ExplanationProvider>,
    store: Arc<dyn KeyValueStore>,
    cache: Arc<ExplanationCache>,
    stats_lock: tokio::sync::Mutex<()>,
}

impl Explainer {
    pub(crate) fn new(
        provider: Arc<dyn ExplanationProvider>,
        store: Arc<dyn KeyValueStore>,
        cache: Arc<ExplanationCache>,
    ) -> Self {
        Self {
            provider,
            store,
            cache,
            stats_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The explanation cache.
    pub fn cache(&self) -> &ExplanationCache {
        &self.cache
    }

    /// The settings store.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Run one request to completion, emitting its events on `sink`.
    ///
    /// The terminal event is always sent before this returns: `ready` for
    /// cache hits, `complete` for network results, `error` (with a
    /// user-facing message) for failures. The returned value mirrors it.
    #[instrument(skip_all, fields(host = %request.origin_hostname, len = request.text.len()))]
    pub async fn explain(&self, request: ExplainRequest, sink: &EventSink) -> Result<Outcome> {
        let started = Instant::now();
        let result = self.run(&request, sink).await;

        let status = match &result {
            Ok(outcome) => {
                if outcome.is_cached() {
                    sink.ready(outcome.text());
                } else {
                    sink.complete(outcome.text());
                }
                "ok"
            }
            Err(e) => {
                warn!(error = %e, "explanation failed");
                sink.error(e.user_message());
                "error"
            }
        };

        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn run(&self, request: &ExplainRequest, sink: &EventSink) -> Result<Outcome> {
        if request.text.trim().is_empty() {
            return Err(ClarityError::InvalidInput(NO_TEXT_MESSAGE.to_string()));
        }

        let settings = Settings::load(self.store.as_ref()).await?;
        let api_key = settings.gemini_key.ok_or(ClarityError::MissingCredential)?;

        let key = derive_key(&request.text, &request.origin_hostname);
        if let Some(cached) = self.cache.get(&key) {
            debug!(%key, "cache hit");
            self.record_usage().await;
            return Ok(Outcome::Cached(cached));
        }

        sink.loading();

        let prompt = build_prompt(settings.detail_level, &request.text);
        let outcome = self.generate(&prompt, &api_key, sink).await?;

        self.cache.insert(key, outcome.text().to_string());
        self.record_usage().await;
        Ok(outcome)
    }

    /// Streaming attempt, then at most one single-shot attempt.
    async fn generate(&self, prompt: &str, api_key: &str, sink: &EventSink) -> Result<Outcome> {
        let reason = match self.stream_attempt(prompt, api_key, sink).await {
            Ok(text) if !text.trim().is_empty() => return Ok(Outcome::Streamed(text)),
            Ok(_) => {
                info!(provider = self.provider.name(), "stream returned no text, retrying single-shot");
                FallbackReason::StreamEmpty
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "stream failed, retrying single-shot");
                FallbackReason::StreamFailed
            }
        };
        metrics::counter!(telemetry::FALLBACKS_TOTAL, "reason" => reason.as_str()).increment(1);

        let text = self.provider.generate(prompt, api_key).await?;
        Ok(Outcome::Fallback { text, reason })
    }

    async fn stream_attempt(&self, prompt: &str, api_key: &str, sink: &EventSink) -> Result<String> {
        let mut body = self.provider.stream_generate(prompt, api_key).await?;
        let mut extractor = StreamExtractor::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            extractor.feed_with(&chunk, |delta| {
                metrics::counter!(telemetry::STREAM_CHUNKS_TOTAL).increment(1);
                sink.chunk(delta);
            });
        }
        if let Some(delta) = extractor.finish() {
            sink.chunk(delta);
        }

        Ok(extractor.into_accumulated())
    }

    /// Count one completed explanation. Failures are logged, not surfaced:
    /// the explanation itself has already succeeded.
    async fn record_usage(&self) {
        let _guard = self.stats_lock.lock().await;
        match UsageStats::record(self.store.as_ref(), now_millis()).await {
            Ok(stats) => debug!(num_explains = stats.num_explains, "usage recorded"),
            Err(e) => warn!(error = %e, "failed to record usage"),
        }
    }
}
