//! History and favorites lists.

mod backend;

pub use backend::{JsonFileState, MemoryState, StateBackend};

use serde_json::Value;

use crate::constants::{FAVORITES_KEY, HISTORY_KEY, MAX_STORED_COLORS, VERSION_KEY};
use crate::error::Result;

/// The two persisted color lists plus the last seen extension version.
pub struct ColorStore {
    backend: Box<dyn StateBackend>,
}

impl ColorStore {
    pub fn new(backend: Box<dyn StateBackend>) -> Self {
        Self { backend }
    }

    pub fn history(&self) -> Vec<String> {
        self.list(HISTORY_KEY)
    }

    pub fn favorites(&self) -> Vec<String> {
        self.list(FAVORITES_KEY)
    }

    pub fn update_history(&mut self, color: &str, old_value: Option<&str>) -> Result<()> {
        self.update_list(HISTORY_KEY, color, old_value)
    }

    pub fn update_favorites(&mut self, color: &str, old_value: Option<&str>) -> Result<()> {
        self.update_list(FAVORITES_KEY, color, old_value)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.backend.set(HISTORY_KEY, Value::Array(Vec::new()))
    }

    pub fn clear_favorites(&mut self) -> Result<()> {
        self.backend.set(FAVORITES_KEY, Value::Array(Vec::new()))
    }

    /// The stored version, or `current` when nothing was stored yet.
    pub fn version_info(&self, current: &str) -> String {
        match self.backend.get(VERSION_KEY) {
            Some(Value::String(version)) => version,
            _ => current.to_string(),
        }
    }

    pub fn set_version_info(&mut self, version: &str) -> Result<()> {
        self.backend
            .set(VERSION_KEY, Value::String(version.to_string()))
    }

    fn list(&self, key: &str) -> Vec<String> {
        let Some(value) = self.backend.get(key) else {
            return Vec::new();
        };
        match serde_json::from_value(value) {
            Ok(list) => list,
            Err(e) => {
                log::warn!("Ignoring malformed {} list: {}", key, e);
                Vec::new()
            }
        }
    }

    fn update_list(&mut self, key: &str, color: &str, old_value: Option<&str>) -> Result<()> {
        let mut list = self.list(key);
        if !apply_update(&mut list, color, old_value) {
            return Ok(());
        }

        if list.len() > MAX_STORED_COLORS {
            list.drain(..list.len() - MAX_STORED_COLORS);
        }

        log::debug!("Updated {} ({} entries)", key, list.len());
        self.backend.set(key, serde_json::to_value(list)?)
    }
}

/// Edits `list` in place and reports whether anything changed.
///
/// With `old_value`, an empty `color` deletes the old entry, otherwise the
/// old entry is replaced where it stands (or `color` appended when the old
/// entry is gone). Without `old_value`, `color` is appended unless empty or
/// already listed.
fn apply_update(list: &mut Vec<String>, color: &str, old_value: Option<&str>) -> bool {
    match old_value {
        Some(old) => {
            let position = list.iter().position(|c| c == old);
            match (color.is_empty(), position) {
                (true, Some(index)) => {
                    list.remove(index);
                    true
                }
                (true, None) => false,
                (false, Some(index)) => {
                    list[index] = color.to_string();
                    true
                }
                (false, None) => {
                    list.push(color.to_string());
                    true
                }
            }
        }
        None => {
            if color.is_empty() || list.iter().any(|c| c == color) {
                false
            } else {
                list.push(color.to_string());
                true
            }
        }
    }
}
