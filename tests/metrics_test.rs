//! Tests for metrics emitted by the explainer.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::{Map, Value, json};

use clarity::providers::ByteStream;
use clarity::store::{GEMINI_KEY, MemoryStore};
use clarity::telemetry;
use clarity::{Clarity, EventSink, ExplainRequest, ExplanationProvider, Explainer, Result};

// ============================================================================
// Mock provider
// ============================================================================

struct MockProvider {
    body: &'static str,
}

#[async_trait]
impl ExplanationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream_generate(&self, _prompt: &str, _api_key: &str) -> Result<ByteStream> {
        Ok(Box::pin(futures_util::stream::iter(vec![Ok(
            Bytes::from_static(self.body.as_bytes()),
        )])))
    }

    async fn generate(&self, _prompt: &str, _api_key: &str) -> Result<String> {
        Ok("single-shot".into())
    }
}

const TWO_CHUNKS: &str = r#"[{"candidates":[{"content":{"parts":[{"text":"a"}]}}]},{"candidates":[{"content":{"parts":[{"text":"b"}]}}]}]"#;

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a name carrying `label = value`.
fn labelled_total(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn has_histogram(snapshot: &SnapshotVec, name: &str) -> bool {
    snapshot
        .iter()
        .any(|(key, _, _, _)| key.kind() == MetricKind::Histogram && key.key().name() == name)
}

fn explainer(body: &'static str, with_key: bool) -> Explainer {
    let mut entries = Map::new();
    if with_key {
        entries.insert(GEMINI_KEY.into(), json!("AIzaSyA-0123456789abcdefghijkl"));
    }
    Clarity::builder()
        .provider(Arc::new(MockProvider { body }))
        .store(Arc::new(MemoryStore::with_entries(entries)))
        .build()
        .unwrap()
}

async fn explain_twice(explainer: &Explainer, text: &str) {
    for _ in 0..2 {
        let (sink, _events) = EventSink::channel(Value::Null);
        let _ = explainer
            .explain(ExplainRequest::new(text, "example.com"), &sink)
            .await;
    }
}

/// Runs `explain_twice` within a local recorder scope on the multi-thread
/// runtime and returns the captured snapshot.
fn record(explainer: &Explainer, text: &str) -> SnapshotVec {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(explain_twice(explainer, text))
        })
    });

    snapshotter.snapshot().into_vec()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn streamed_then_cached_request_metrics() {
    let explainer = explainer(TWO_CHUNKS, true);
    let snapshot = record(&explainer, "osmosis");

    assert_eq!(
        labelled_total(&snapshot, telemetry::REQUESTS_TOTAL, "status", "ok"),
        2
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_total(&snapshot, telemetry::STREAM_CHUNKS_TOTAL), 2);
    assert_eq!(counter_total(&snapshot, telemetry::FALLBACKS_TOTAL), 0);
    assert!(has_histogram(&snapshot, telemetry::REQUEST_DURATION_SECONDS));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn empty_stream_records_fallback_reason() {
    let explainer = explainer("[]", true);
    let snapshot = record(&explainer, "osmosis");

    // The second request is a cache hit, so only one fallback.
    assert_eq!(
        labelled_total(&snapshot, telemetry::FALLBACKS_TOTAL, "reason", "stream_empty"),
        1
    );
    assert_eq!(counter_total(&snapshot, telemetry::STREAM_CHUNKS_TOTAL), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn failed_requests_record_error_status() {
    let explainer = explainer(TWO_CHUNKS, false);
    let snapshot = record(&explainer, "osmosis");

    assert_eq!(
        labelled_total(&snapshot, telemetry::REQUESTS_TOTAL, "status", "error"),
        2
    );
    assert_eq!(
        labelled_total(&snapshot, telemetry::REQUESTS_TOTAL, "status", "ok"),
        0
    );
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 0);
}
