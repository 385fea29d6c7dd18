//! Incremental JSON object extraction from a streamed response body.
//!
//! The streaming endpoint returns one JSON array whose elements arrive over
//! time, split at arbitrary byte boundaries. [`StreamExtractor`] scans the
//! bytes once, tracking string/escape state and brace depth, and hands every
//! top-level object to the parser the moment its closing brace arrives.
//!
//! Scanning works on bytes rather than text: the structural characters are
//! all ASCII, so a multi-byte UTF-8 sequence split across two chunks is
//! simply carried in the buffer until its object completes.
//!
//! Objects that fail to parse, or that lack
//! `candidates[0].content.parts[0].text`, are dropped without error. A
//! stream may legitimately contain noise between complete objects.

use tracing::{debug, trace};

use crate::types::GenerateContentResponse;

/// Text extracted from one complete stream object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    /// The text carried by this object alone.
    pub text: String,
    /// All text extracted so far, including this delta.
    pub accumulated: String,
}

/// Restartable scanner over a streamed JSON array.
///
/// Scanner state is carried between [`feed`](Self::feed) calls, so every
/// byte is examined exactly once. The buffer only ever holds the bytes of
/// the object currently in flight (plus any separators before it).
#[derive(Debug, Default)]
pub struct StreamExtractor {
    buffer: Vec<u8>,
    /// Next unscanned index into `buffer`.
    cursor: usize,
    depth: usize,
    in_string: bool,
    escape_next: bool,
    object_start: usize,
    accumulated: String,
}

impl StreamExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next chunk and return the deltas of every object it closed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Delta> {
        let mut deltas = Vec::new();
        self.feed_with(chunk, |delta| deltas.push(delta));
        deltas
    }

    /// Consume the next chunk, invoking `on_object` for each extracted delta
    /// in stream order.
    pub fn feed_with<F>(&mut self, chunk: &[u8], mut on_object: F)
    where
        F: FnMut(Delta),
    {
        self.buffer.extend_from_slice(chunk);

        while self.cursor < self.buffer.len() {
            let pos = self.cursor;
            let byte = self.buffer[pos];
            self.cursor += 1;

            if self.in_string {
                if self.escape_next {
                    self.escape_next = false;
                } else if byte == b'\\' {
                    self.escape_next = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' => {
                    if self.depth == 0 {
                        self.object_start = pos;
                    }
                    self.depth += 1;
                }
                // A stray closer outside any object is noise.
                b'}' if self.depth > 0 => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        let object: Vec<u8> = self.buffer.drain(..=pos).collect();
                        let start = self.object_start;
                        self.cursor = 0;
                        self.object_start = 0;
                        if let Some(delta) = self.extract(&object[start..]) {
                            on_object(delta);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Final pass at end of stream.
    ///
    /// Whatever is left unconsumed (besides array punctuation and
    /// whitespace) is given one parse attempt. Failure is not an error.
    pub fn finish(&mut self) -> Option<Delta> {
        let rest = std::mem::take(&mut self.buffer);
        self.cursor = 0;
        self.depth = 0;
        self.in_string = false;
        self.escape_next = false;
        self.object_start = 0;

        let trimmed = trim_separators(&rest);
        if trimmed.is_empty() {
            return None;
        }
        trace!(len = trimmed.len(), "parsing stream remainder");
        self.extract(trimmed)
    }

    /// All text extracted so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Consume the extractor, returning the accumulated text.
    pub fn into_accumulated(self) -> String {
        self.accumulated
    }

    /// Bytes received but not yet part of a complete object.
    pub fn remaining(&self) -> &[u8] {
        &self.buffer
    }

    fn extract(&mut self, object: &[u8]) -> Option<Delta> {
        let response: GenerateContentResponse = match serde_json::from_slice(object) {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, len = object.len(), "discarding unparsable stream object");
                return None;
            }
        };
        let text = response.into_first_text()?;
        self.accumulated.push_str(&text);
        Some(Delta {
            text,
            accumulated: self.accumulated.clone(),
        })
    }
}

fn trim_separators(bytes: &[u8]) -> &[u8] {
    let is_separator = |b: &u8| b.is_ascii_whitespace() || matches!(b, b'[' | b']' | b',');
    let start = bytes.iter().position(|b| !is_separator(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_separator(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}
