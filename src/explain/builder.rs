//! Builder for configuring explainer instances

use std::sync::Arc;
use std::time::Duration;

use super::Explainer;
use crate::Result;
use crate::cache::{DEFAULT_CACHE_CAPACITY, ExplanationCache};
use crate::providers::{ExplanationProvider, GeminiClient};
use crate::providers::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::store::{KeyValueStore, MemoryStore};

/// Main entry point for creating explainer instances.
pub struct Clarity;

impl Clarity {
    /// Create a new builder for configuring the explainer.
    pub fn builder() -> ClarityBuilder {
        ClarityBuilder::new()
    }
}

/// Builder for configuring explainer instances.
pub struct ClarityBuilder {
    gemini_base_url: String,
    model: String,
    request_timeout: Option<Duration>,
    cache_capacity: usize,
    store: Option<Arc<dyn KeyValueStore>>,
    provider: Option<Arc<dyn ExplanationProvider>>,
}

impl ClarityBuilder {
    pub fn new() -> Self {
        Self {
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            store: None,
            provider: None,
        }
    }

    /// Override the generative-language API base URL.
    pub fn gemini_base_url(mut self, url: impl Into<String>) -> Self {
        self.gemini_base_url = url.into();
        self
    }

    /// Override the model (default: `gemini-2.5-flash`).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Bound each provider call. Unbounded by default.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Maximum number of cached explanations (default: 200).
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Settings/usage store. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom provider instead of the Gemini client. The base URL,
    /// model and timeout settings are then ignored.
    pub fn provider(mut self, provider: Arc<dyn ExplanationProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the explainer.
    pub fn build(self) -> Result<Explainer> {
        let cache = Arc::new(ExplanationCache::with_capacity(self.cache_capacity)?);

        let provider = match self.provider {
            Some(provider) => provider,
            None => Arc::new(GeminiClient::with_base_url(
                self.gemini_base_url,
                self.model,
                self.request_timeout,
            )?),
        };

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);

        Ok(Explainer::new(provider, store, cache))
    }
}

impl Default for ClarityBuilder {
    fn default() -> Self {
        Self::new()
    }
}
