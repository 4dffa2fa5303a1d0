//! In-memory session store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::{SessionStore, SessionStoreError};

/// A [`SessionStore`] backed by a shared `HashMap`.
///
/// Clones share the same map, so a test can hand one clone to the code
/// under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().is_ok_and(|values| values.contains_key(key))
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |values| values.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Value>>, SessionStoreError> {
        self.values
            .lock()
            .map_err(|_| SessionStoreError::Backend("session map poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_value(&self, key: &str) -> Result<Option<Value>, SessionStoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn store_value(&self, key: &str, value: Value) -> Result<(), SessionStoreError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<(), SessionStoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn flush_all(&self) -> Result<(), SessionStoreError> {
        self.lock()?.clear();
        Ok(())
    }
}
