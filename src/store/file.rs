//! JSON file store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::KeyValueStore;
use crate::{ClarityError, Result};

/// Store persisted as a single JSON object on disk.
///
/// Every `set` rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact. The
/// async mutex serialises writers within this process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Use `path` as the backing file. It is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(ClarityError::Store(format!(
                    "failed to read {:?}: {e}",
                    self.path
                )));
            }
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        match serde_json::from_slice::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ClarityError::Store(format!(
                "{:?} does not contain a JSON object",
                self.path
            ))),
            Err(e) => Err(ClarityError::Store(format!(
                "failed to parse {:?}: {e}",
                self.path
            ))),
        }
    }

    async fn write_all(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ClarityError::Store(format!("failed to create {parent:?}: {e}"))
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| ClarityError::Store(format!("failed to write {tmp:?}: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ClarityError::Store(format!("failed to replace {:?}: {e}", self.path)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|k| all.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.extend(items);
        self.write_all(&all).await
    }
}
