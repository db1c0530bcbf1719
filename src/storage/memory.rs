//! In-process storage backend. Used by tests and `--ephemeral` sessions.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Storage, StorageError};

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
    disabled: bool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every operation fails, standing in for a browser
    /// with storage disabled.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { items: Mutex::default(), disabled: true }
    }

    fn items(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        self.items.lock().map_err(|_| StorageError::Unavailable)
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items()?.keys().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.items()?.clear();
        Ok(())
    }
}
