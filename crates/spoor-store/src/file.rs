//! File-backed storage backend.

use crate::{KeyValueStore, StoreResult};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Key-value storage backed by a single JSON object file.
///
/// Every mutation rewrites the file before returning, so a process killed
/// mid-session never loses an acknowledged write. A pre-existing file that
/// cannot be parsed is treated as empty rather than an error.
pub struct FileStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl FileStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: PathBuf) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(error) => {
                    warn!(%error, path = %path.display(), "Unreadable store file, starting empty");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            data: Mutex::new(data),
        };

        // Probe writability up front so degradation happens at open time.
        store.flush(&store.data.lock().unwrap_or_else(|e| e.into_inner()))?;

        Ok(store)
    }

    /// The file this store persists to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn flush(&self, data: &Map<String, Value>) -> StoreResult<()> {
        let content = serde_json::to_string(data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        data.insert(key.to_string(), Value::String(value.to_string()));
        self.flush(&data)
    }

    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        Ok(data.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        let removed = data.remove(key).is_some();
        if removed {
            self.flush(&data)?;
        }
        Ok(removed)
    }
}
