//! Durable persistence of the current snapshot.
//!
//! Only the current value is persisted, as a full JSON document. On startup
//! the stored value replaces the initial snapshot; no history is restored.

pub mod error;
mod file;
mod throttle;

pub use error::StorageError;
pub use file::FileStorage;
pub(crate) use throttle::PersistThrottle;
pub use throttle::DEFAULT_THROTTLE_WINDOW;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::warn;

/// Default storage key.
pub const DEFAULT_STORAGE_KEY: &str = "redo-state";

/// Key-value blob store.
pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, mainly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.entries.lock().insert(key.into(), value.into());
        storage
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read a previously persisted snapshot.
///
/// Missing, `"undefined"` or unparsable blobs all count as no prior state.
pub(crate) fn restore<S: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<S> {
    let blob = match storage.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "could not read persisted state");
            return None;
        }
    };
    if blob.is_empty() || blob == "undefined" {
        return None;
    }
    match serde_json::from_str(&blob) {
        Ok(state) => Some(state),
        Err(err) => {
            warn!(key, error = %err, "ignoring corrupt persisted state");
            None
        }
    }
}
