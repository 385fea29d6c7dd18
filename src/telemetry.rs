//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus,
//! statsd); without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `clarity_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total explanation requests that reached a terminal state.
///
/// Labels: `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "clarity_requests_total";

/// Explanation request duration in seconds, cache hits included.
pub const REQUEST_DURATION_SECONDS: &str = "clarity_request_duration_seconds";

/// Total explanation cache hits.
pub const CACHE_HITS_TOTAL: &str = "clarity_cache_hits_total";

/// Total explanation cache misses.
pub const CACHE_MISSES_TOTAL: &str = "clarity_cache_misses_total";

/// Total single-shot retries after the streaming attempt did not deliver.
///
/// Labels: `reason` ("stream_error" | "stream_empty").
pub const FALLBACKS_TOTAL: &str = "clarity_fallbacks_total";

/// Total text deltas extracted from streamed responses.
pub const STREAM_CHUNKS_TOTAL: &str = "clarity_stream_chunks_total";
