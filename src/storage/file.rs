//! JSON-file storage backend.
//!
//! The whole store is one JSON object of string values. Every operation
//! re-reads the file so concurrent processes observe each other's writes;
//! writes go to a sibling temp file and are renamed into place so a reader
//! never sees a half-written document.

#[cfg(test)]
#[path = "file_test.rs"]
mod file_test;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Storage, StorageError};

type Items = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Items, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Items::new()),
            Err(e) => return Err(StorageError::Read(format!("{}: {e}", self.path.display()))),
        };
        if raw.trim().is_empty() {
            return Ok(Items::new());
        }
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn persist(&self, items: &Items) -> Result<(), StorageError> {
        let write_err = |e: std::io::Error| StorageError::Write(format!("{}: {e}", self.path.display()));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let body = serde_json::to_string_pretty(items).map_err(|e| StorageError::Write(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn update(&self, f: impl FnOnce(&mut Items)) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Unavailable)?;
        let mut items = self.load()?;
        f(&mut items);
        self.persist(&items)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| {
            items.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.load()?.into_keys().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.update(BTreeMap::clear)
    }
}
