//! Key-value backends for the persisted extension state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use crate::error::{Error, Result};

/// Key-value storage the color lists are kept in.
pub trait StateBackend: Send {
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`. Implementations persist before returning.
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// State kept in a single JSON object on disk.
///
/// Values are cached in memory and the whole file is rewritten on every
/// change.
pub struct JsonFileState {
    path: PathBuf,
    cache: HashMap<String, Value>,
}

impl JsonFileState {
    /// Opens the state file at `path`. A missing file starts empty, an
    /// unreadable one starts empty with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(cache) => cache,
                Err(e) => {
                    log::warn!("Ignoring malformed state file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                log::warn!("Failed to read state file {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self { path, cache }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::Storage {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents = serde_json::to_string_pretty(&self.cache)?;
        fs::write(&self.path, contents).map_err(|source| Error::Storage {
            path: self.path.clone(),
            source,
        })?;

        log::trace!("Wrote state to {}", self.path.display());
        Ok(())
    }
}

impl StateBackend for JsonFileState {
    fn get(&self, key: &str) -> Option<Value> {
        self.cache.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.cache.insert(key.to_string(), value);
        self.flush()
    }
}

/// Volatile state, used by tests and when no data directory is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryState {
    values: HashMap<String, Value>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryState {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_json_state_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("state.json");

        {
            let mut state = JsonFileState::open(&path);
            state
                .set("cfc.history", serde_json::json!(["#fff"]))
                .unwrap();
        }

        let state = JsonFileState::open(&path);
        assert_eq!(state.get("cfc.history"), Some(serde_json::json!(["#fff"])));
        assert_eq!(state.get("cfc.favorites"), None);
    }

    #[test]
    fn test_json_state_ignores_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let mut state = JsonFileState::open(&path);
        assert_eq!(state.get("cfc.history"), None);

        state.set("cfc.version", serde_json::json!("0.1.0")).unwrap();
        let reopened = JsonFileState::open(&path);
        assert_eq!(reopened.get("cfc.version"), Some(serde_json::json!("0.1.0")));
    }

    #[test]
    fn test_memory_state() {
        let mut state = MemoryState::new();
        assert_eq!(state.get("a"), None);
        state.set("a", serde_json::json!(1)).unwrap();
        assert_eq!(state.get("a"), Some(serde_json::json!(1)));
    }
}
