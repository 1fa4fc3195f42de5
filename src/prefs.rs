//! Persisted key-value preferences (the browser's local storage).

use std::collections::HashMap;

use crate::error::StoreError;

/// Get/set contract for persisted string preferences.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store. Optionally refuses writes, which is how a full or
/// disabled browser storage behaves.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.values.insert(key.to_owned(), value.to_owned());
        store
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::QuotaExceeded {
                key: key.to_owned(),
            });
        }
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
