//! Typed views over the well-known store keys.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::{
    DETAIL_LEVEL, FIRST_USE, GEMINI_KEY, KeyValueStore, LAST_USE, NUM_EXPLAINS, THEME,
    string_value,
};
use crate::types::{DetailLevel, Theme};
use crate::{ClarityError, Result};

/// Shortest key the settings form accepts.
pub const MIN_API_KEY_LEN: usize = 25;

/// User settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub gemini_key: Option<String>,
    pub detail_level: DetailLevel,
    pub theme: Theme,
}

impl Settings {
    /// Load settings, defaulting anything unset or unrecognised.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let stored = store.get(&[GEMINI_KEY, DETAIL_LEVEL, THEME]).await?;
        Ok(Self {
            gemini_key: string_value(&stored, GEMINI_KEY),
            detail_level: DetailLevel::from_setting(stored.get(DETAIL_LEVEL).and_then(Value::as_str)),
            theme: Theme::from_setting(stored.get(THEME).and_then(Value::as_str)),
        })
    }

    /// Validate and persist all three settings.
    ///
    /// The key is trimmed before validation and storage.
    pub async fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let key = validate_api_key(self.gemini_key.as_deref().unwrap_or_default())?;

        let mut items = Map::new();
        items.insert(GEMINI_KEY.into(), json!(key));
        items.insert(DETAIL_LEVEL.into(), json!(self.detail_level.as_str()));
        items.insert(THEME.into(), json!(self.theme.as_str()));
        store.set(items).await
    }

    /// Whether a non-blank key is configured.
    pub fn has_api_key(&self) -> bool {
        self.gemini_key.is_some()
    }
}

/// Check a key entered by the user, returning it trimmed.
pub fn validate_api_key(raw: &str) -> Result<&str> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ClarityError::InvalidInput(
            "Please enter your Gemini API key".to_string(),
        ));
    }
    if key.chars().count() < MIN_API_KEY_LEN {
        return Err(ClarityError::InvalidInput(format!(
            "API key must be at least {MIN_API_KEY_LEN} characters long"
        )));
    }
    Ok(key)
}

/// Usage counters shown in the extension popup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub num_explains: u64,
    pub first_use: Option<u64>,
    pub last_use: Option<u64>,
}

impl UsageStats {
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let stored = store.get(&[NUM_EXPLAINS, FIRST_USE, LAST_USE]).await?;
        Ok(Self {
            num_explains: stored.get(NUM_EXPLAINS).and_then(Value::as_u64).unwrap_or(0),
            first_use: stored.get(FIRST_USE).and_then(Value::as_u64),
            last_use: stored.get(LAST_USE).and_then(Value::as_u64),
        })
    }

    /// Count one completed explanation at `now_ms`.
    ///
    /// This is a plain read-modify-write; callers sharing a store across
    /// concurrent requests must serialise calls themselves.
    pub async fn record(store: &dyn KeyValueStore, now_ms: u64) -> Result<Self> {
        let current = Self::load(store).await?;
        let updated = Self {
            num_explains: current.num_explains + 1,
            first_use: Some(current.first_use.unwrap_or(now_ms)),
            last_use: Some(now_ms),
        };

        let mut items = Map::new();
        items.insert(NUM_EXPLAINS.into(), json!(updated.num_explains));
        items.insert(FIRST_USE.into(), json!(updated.first_use));
        items.insert(LAST_USE.into(), json!(updated.last_use));
        store.set(items).await?;
        Ok(updated)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "AIzaSyA-0123456789abcdefghijkl";

    #[tokio::test]
    async fn defaults_when_empty() {
        let store = MemoryStore::new();
        let settings = Settings::load(&store).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.has_api_key());
        assert_eq!(settings.detail_level, DetailLevel::Brief);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn blank_key_is_not_a_key() {
        let mut entries = Map::new();
        entries.insert(GEMINI_KEY.into(), json!("   "));
        let store = MemoryStore::with_entries(entries);
        assert!(!Settings::load(&store).await.unwrap().has_api_key());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let settings = Settings {
            gemini_key: Some(format!("  {KEY} ")),
            detail_level: DetailLevel::Detailed,
            theme: Theme::Light,
        };
        settings.save(&store).await.unwrap();

        let loaded = Settings::load(&store).await.unwrap();
        assert_eq!(loaded.gemini_key.as_deref(), Some(KEY));
        assert_eq!(loaded.detail_level, DetailLevel::Detailed);
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[tokio::test]
    async fn save_rejects_bad_keys() {
        let store = MemoryStore::new();
        let empty = Settings::default().save(&store).await.unwrap_err();
        assert_eq!(empty.user_message(), "Please enter your Gemini API key");

        let short = Settings {
            gemini_key: Some("too-short".into()),
            ..Settings::default()
        };
        let err = short.save(&store).await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "API key must be at least 25 characters long"
        );
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn record_increments_and_keeps_first_use() {
        let store = MemoryStore::new();
        let first = UsageStats::record(&store, 1_000).await.unwrap();
        assert_eq!(
            first,
            UsageStats {
                num_explains: 1,
                first_use: Some(1_000),
                last_use: Some(1_000)
            }
        );

        let second = UsageStats::record(&store, 2_000).await.unwrap();
        assert_eq!(second.num_explains, 2);
        assert_eq!(second.first_use, Some(1_000));
        assert_eq!(second.last_use, Some(2_000));
        assert_eq!(UsageStats::load(&store).await.unwrap(), second);
    }
}
