//! In-process store.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::Result;

/// Store backed by an in-memory JSON object. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: Map<String, Value>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Copy of everything stored.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(items);
        Ok(())
    }
}
