//! Clarity - on-page explanations backed by Gemini
//!
//! This crate implements the background pipeline of the Clarity browser
//! extension: a user selects text on a page, and an explanation is
//! streamed back to an overlay anchored at the selection.
//!
//! - [`Explainer`] orchestrates one request: validation, settings lookup,
//!   the LRU [`ExplanationCache`], a streaming call to the provider and a
//!   single-shot fallback.
//! - [`stream::StreamExtractor`] pulls text deltas out of the provider's
//!   streamed JSON array as bytes arrive.
//! - [`Relay`] routes page messages and delivers [`ExplainEvent`]s in order
//!   with exactly one terminal event per request.
//! - [`host`] (feature `host`) speaks the browser's native messaging
//!   protocol on stdin/stdout; see the `clarityd` binary.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use clarity::store::{MemoryStore, Settings};
//! use clarity::{Clarity, EventSink, ExplainRequest};
//!
//! #[tokio::main]
//! async fn main() -> clarity::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     Settings {
//!         gemini_key: Some("AIzaSy-your-key-goes-here-0000".into()),
//!         ..Settings::default()
//!     }
//!     .save(store.as_ref())
//!     .await?;
//!
//!     let explainer = Clarity::builder().store(store).build()?;
//!     let (sink, _events) = EventSink::channel(serde_json::Value::Null);
//!     let outcome = explainer
//!         .explain(ExplainRequest::new("photosynthesis", "example.com"), &sink)
//!         .await?;
//!
//!     println!("{}", outcome.text());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod explain;
#[cfg(feature = "host")]
pub mod host;
pub mod prompt;
pub mod providers;
pub mod relay;
pub mod store;
pub mod stream;
pub mod telemetry;
pub mod types;

/// Crate version.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cache::{ExplanationCache, Fingerprint, derive_key};
pub use error::{ClarityError, Result};
pub use explain::{Clarity, ClarityBuilder, Explainer, FallbackReason, Outcome};
pub use providers::{ExplanationProvider, GeminiClient};
pub use relay::{ControlMessage, EventSink, EventStream, ExplainEvent, Relay};
pub use types::{DetailLevel, ExplainPayload, ExplainRequest, Theme};
