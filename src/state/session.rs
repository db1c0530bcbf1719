//! Session store: the credential and per-user cached artifacts.
//!
//! ARCHITECTURE
//! ============
//! Everything lives in one [`Storage`] backend. The credential sits under a
//! fixed key; artifacts (profile images) are namespaced by [`UserId`]
//! through [`ArtifactKey`], which is the only code that formats or parses
//! artifact keys. Lookups take a `UserId`, never a raw key, so one user's
//! artifact cannot be read under another user's session.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures never propagate out of credential operations: they are
//! logged and reads degrade to "absent", which callers already handle as
//! "not logged in" or "no image".

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::fmt;
use std::sync::Arc;

use crate::net::types::UserId;
use crate::storage::{Storage, StorageError};

/// Fixed storage key for the bearer credential.
pub const CREDENTIAL_KEY: &str = "token";

/// Storage key prefix shared by every per-user artifact.
pub const ARTIFACT_PREFIX: &str = "userProfileImage_";

/// Opaque bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens must not end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Storage key of one user's cached artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArtifactKey(UserId);

impl ArtifactKey {
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self(user_id)
    }

    #[must_use]
    pub fn user_id(self) -> UserId {
        self.0
    }

    #[must_use]
    pub fn storage_key(self) -> String {
        format!("{ARTIFACT_PREFIX}{}", self.0)
    }

    /// Recognize any key in the artifact namespace, including legacy or
    /// malformed suffixes, which map to `None` here but still count as
    /// artifacts for [`SessionStore::clear_all_artifacts`].
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        key.strip_prefix(ARTIFACT_PREFIX)?.parse::<i64>().ok().map(|id| Self(UserId(id)))
    }
}

/// Credential and artifact persistence over a shared storage backend.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // -------------------------------------------------------------------------
    // Credential
    // -------------------------------------------------------------------------

    /// Persist the credential. On storage failure the error is logged and a
    /// later [`load_credential`](Self::load_credential) may return `None`.
    pub fn save_credential(&self, credential: &Credential) {
        if let Err(e) = self.storage.set_item(CREDENTIAL_KEY, credential.as_str()) {
            tracing::warn!(error = %e, "credential not persisted");
        }
    }

    #[must_use]
    pub fn load_credential(&self) -> Option<Credential> {
        match self.storage.get_item(CREDENTIAL_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()).map(Credential),
            Err(e) => {
                tracing::warn!(error = %e, "credential unreadable; treating as absent");
                None
            }
        }
    }

    /// Remove the credential. Idempotent.
    pub fn clear_credential(&self) {
        if let Err(e) = self.storage.remove_item(CREDENTIAL_KEY) {
            tracing::warn!(error = %e, "credential not cleared");
        }
    }

    // -------------------------------------------------------------------------
    // Artifacts
    // -------------------------------------------------------------------------

    /// Store `data` as `user_id`'s artifact.
    ///
    /// # Errors
    ///
    /// Returns the storage error so user-initiated uploads can report it.
    pub fn save_artifact(&self, user_id: UserId, data: &str) -> Result<(), StorageError> {
        self.storage.set_item(&ArtifactKey::new(user_id).storage_key(), data)
    }

    #[must_use]
    pub fn load_artifact(&self, user_id: UserId) -> Option<String> {
        match self.storage.get_item(&ArtifactKey::new(user_id).storage_key()) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, %user_id, "artifact unreadable; treating as absent");
                None
            }
        }
    }

    /// Remove `user_id`'s artifact.
    ///
    /// # Errors
    ///
    /// Returns the storage error so user-initiated removals can report it.
    pub fn clear_artifact(&self, user_id: UserId) -> Result<(), StorageError> {
        self.storage.remove_item(&ArtifactKey::new(user_id).storage_key())
    }

    /// Remove every key in the artifact namespace, whoever it belongs to.
    /// Returns the number of keys removed.
    pub fn clear_all_artifacts(&self) -> usize {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "artifact keys unreadable; nothing purged");
                return 0;
            }
        };
        let mut removed = 0;
        for key in keys.iter().filter(|k| k.starts_with(ARTIFACT_PREFIX)) {
            match self.storage.remove_item(key) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(error = %e, key = %key, "artifact not purged"),
            }
        }
        removed
    }

    /// User ids that currently have a stored artifact.
    #[must_use]
    pub fn artifact_owners(&self) -> Vec<UserId> {
        self.storage
            .keys()
            .unwrap_or_default()
            .iter()
            .filter_map(|k| ArtifactKey::parse(k))
            .map(ArtifactKey::user_id)
            .collect()
    }

    /// Wipe the whole backend (account deletion).
    pub fn clear_all(&self) {
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "storage not cleared");
        }
    }
}
