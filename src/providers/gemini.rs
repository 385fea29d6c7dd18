//! Gemini generative-language API client.
//!
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use tracing::{debug, instrument};

use super::traits::{ByteStream, ExplanationProvider};
use crate::types::gemini::ErrorResponse;
use crate::types::{GenerateContentRequest, GenerateContentResponse};
use crate::{ClarityError, Result};

/// Default base URL for the generative-language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used for explanations
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Client for the Gemini `generateContent` / `streamGenerateContent` endpoints.
///
/// The API key is supplied per call because it is read from the settings
/// store on every request and may change between requests.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a client against the public endpoint with the default model.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_MODEL, None)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    ///
    /// `timeout` bounds the whole request including the streamed body.
    /// `None` leaves the call unbounded, matching the extension's behaviour.
    pub fn with_base_url(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            ClarityError::Configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Model this client generates with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    async fn post(&self, method: &str, prompt: &str, api_key: &str) -> Result<Response> {
        let response = self
            .http
            .post(self.endpoint(method))
            .query(&[("key", api_key)])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        debug!(status = %response.status(), method, "provider responded");
        check_status(response).await
    }
}

/// Map non-success statuses to errors.
///
/// 429 is the distinguished rate-limit condition. Other failures carry the
/// provider's error message when the body has one.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ClarityError::RateLimited { retry_after });
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));

    Err(ClarityError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ExplanationProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(name = "gemini.stream_generate", skip(self, prompt, api_key), fields(model = %self.model))]
    async fn stream_generate(&self, prompt: &str, api_key: &str) -> Result<ByteStream> {
        let response = self.post("streamGenerateContent", prompt, api_key).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClarityError::Stream(e.without_url().to_string())));
        Ok(Box::pin(body))
    }

    #[instrument(name = "gemini.generate", skip(self, prompt, api_key), fields(model = %self.model))]
    async fn generate(&self, prompt: &str, api_key: &str) -> Result<String> {
        let response = self.post("generateContent", prompt, api_key).await?;
        let body = response.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&body)
            .map_err(|e| ClarityError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        parsed.into_first_text().ok_or_else(|| {
            ClarityError::MalformedResponse("Invalid response format from Gemini API".to_string())
        })
    }
}
