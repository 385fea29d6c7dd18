//! Provider trait for explanation backends.
//!
//! The orchestrator only needs two capabilities from a backend: a streaming
//! call that yields the raw response body as it arrives, and a single-shot
//! call that yields the finished text. Object extraction from the raw body
//! is left to [`StreamExtractor`](crate::stream::StreamExtractor).

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

use crate::Result;

/// Raw streamed response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Backend capable of generating explanations.
///
/// Error contract shared by both calls:
/// - HTTP 429 → [`RateLimited`](crate::ClarityError::RateLimited)
/// - other non-2xx → [`Api`](crate::ClarityError::Api)
/// - transport failure → [`Http`](crate::ClarityError::Http)
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Start a streaming generation for `prompt`.
    ///
    /// Returns once response headers have been accepted; body chunks are
    /// yielded in arrival order, split at arbitrary byte boundaries.
    async fn stream_generate(&self, prompt: &str, api_key: &str) -> Result<ByteStream>;

    /// Single request/response generation.
    ///
    /// Returns `candidates[0].content.parts[0].text`, or
    /// [`MalformedResponse`](crate::ClarityError::MalformedResponse) if the
    /// body lacks that path.
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String>;
}
