//! Clarity error types

use std::time::Duration;

/// Shown when the provider rejects the request for quota reasons.
pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again later.";
/// Shown when the provider rejects the configured key.
pub const INVALID_KEY_MESSAGE: &str = "Invalid API key. Please check your settings.";
/// Shown when no key has been stored yet.
pub const MISSING_KEY_MESSAGE: &str =
    "API key not found. Please add your Gemini API key in settings.";
/// Shown when the provider could not be reached.
pub const NETWORK_MESSAGE: &str = "Network error. Please check your connection.";
/// Fallback for everything else.
pub const GENERIC_MESSAGE: &str = "An error occurred while getting explanation";

/// Clarity error types
#[derive(Debug, thiserror::Error)]
pub enum ClarityError {
    // Request validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("API key not found")]
    MissingCredential,

    // Provider/network errors
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("stream error: {0}")]
    Stream(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClarityError {
    /// Map this error to the message shown in the overlay.
    ///
    /// Classification order matters: rate limiting wins over everything,
    /// then anything mentioning the API key, then transport failures.
    pub fn user_message(&self) -> String {
        match self {
            ClarityError::InvalidInput(msg) => msg.clone(),
            ClarityError::MissingCredential => MISSING_KEY_MESSAGE.to_string(),
            ClarityError::RateLimited { .. } => RATE_LIMIT_MESSAGE.to_string(),
            e if e.to_string().contains("API key") => INVALID_KEY_MESSAGE.to_string(),
            ClarityError::Http(_) | ClarityError::Stream(_) => NETWORK_MESSAGE.to_string(),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    /// Whether this is the distinguished HTTP 429 condition.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ClarityError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for ClarityError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the key as a query parameter.
        ClarityError::Http(err.without_url().to_string())
    }
}

/// Result type alias for Clarity operations
pub type Result<T> = std::result::Result<T, ClarityError>;
