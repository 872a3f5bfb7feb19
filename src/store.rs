//! Persistent key-value storage seam.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Key under which the depth-12 checkpoint is written. Never prefixed.
pub const CHECKPOINT_KEY: &str = "ceval.fen";

/// String key-value storage shared by controller instances.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}

/// In-memory store, shareable across controllers through `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }
}

/// Qualifies storage keys with an optional per-controller prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageKeys {
    prefix: Option<String>,
}

impl StorageKeys {
    #[must_use]
    pub fn new(prefix: Option<&str>) -> Self {
        StorageKeys {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
        }
    }

    /// `<prefix>.<key>`, or `key` when no prefix is set.
    #[must_use]
    pub fn key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.to_string(),
        }
    }
}
