//! Prompt construction.
//!
//! Both the streaming and the single-shot call paths build their prompt
//! here. The selected text is wrapped in double quotes verbatim. Page
//! context is not part of the prompt.

use crate::types::DetailLevel;

/// Build the prompt for `text` at the given verbosity.
pub fn build_prompt(detail: DetailLevel, text: &str) -> String {
    match detail {
        DetailLevel::Simple => {
            format!("Explain in very simple terms, as if to a 12-year-old: \"{text}\"")
        }
        DetailLevel::Brief => format!("Explain in 1\u{2013}2 sentences: \"{text}\""),
        DetailLevel::Detailed => {
            format!("Provide a comprehensive explanation with examples and context: \"{text}\"")
        }
    }
}
