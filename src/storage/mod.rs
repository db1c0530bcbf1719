//! Durable key/value storage.
//!
//! DESIGN
//! ======
//! `Storage` mirrors the browser `localStorage` surface: string keys, string
//! values, key enumeration, and a full clear. The session layer builds its
//! typed keys on top, so backends never see anything but opaque strings.
//!
//! Backends are process-shared: two clients pointed at the same file see
//! each other's writes with last-write-wins semantics and no locking.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Errors produced by storage backends. Callers treat all of them as
/// "storage unavailable".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be read.
    #[error("storage read failed: {0}")]
    Read(String),

    /// The backend could not be written.
    #[error("storage write failed: {0}")]
    Write(String),

    /// The persisted data exists but is not a string map.
    #[error("storage corrupt: {0}")]
    Corrupt(String),

    /// The backend is disabled or its lock was poisoned.
    #[error("storage unavailable")]
    Unavailable,
}

/// String key/value store with `localStorage` semantics.
pub trait Storage: Send + Sync {
    /// Value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}
