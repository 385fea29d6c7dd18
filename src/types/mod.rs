//! Public types for the Clarity API.

mod detail;
pub mod gemini;
mod request;

pub use detail::{DetailLevel, Theme};
pub use gemini::{GenerateContentRequest, GenerateContentResponse};
pub use request::{ExplainPayload, ExplainRequest};
