//! Persistent key-value settings store.
//!
//! The extension keeps its API key, preferences and usage counters in a
//! flat JSON key-value store. [`KeyValueStore`] models that collaborator
//! with the same get-many / merge-set semantics; [`MemoryStore`] and
//! [`FileStore`] are the two backends shipped here.
//!
//! Typed views over the well-known keys live in [`settings`].

mod file;
mod memory;
pub mod settings;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use settings::{Settings, UsageStats};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;

/// Stored Gemini API key.
pub const GEMINI_KEY: &str = "GEMINI_KEY";
/// Stored [`DetailLevel`](crate::DetailLevel).
pub const DETAIL_LEVEL: &str = "detailLevel";
/// Stored [`Theme`](crate::Theme).
pub const THEME: &str = "theme";
/// Number of completed explanations.
pub const NUM_EXPLAINS: &str = "numExplains";
/// Milliseconds since the epoch of the first completed explanation.
pub const FIRST_USE: &str = "firstUse";
/// Milliseconds since the epoch of the latest completed explanation.
pub const LAST_USE: &str = "lastUse";

/// Flat JSON key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the given keys. Keys that are not stored are omitted.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    /// Merge `items` into the store, overwriting existing keys.
    async fn set(&self, items: Map<String, Value>) -> Result<()>;
}

/// Read a single non-empty string value.
pub(crate) fn string_value(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
