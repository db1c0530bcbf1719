//! Application context.
//!
//! DESIGN
//! ======
//! `AppContext` is built once at startup and passed by reference to whatever
//! front end drives it. It owns one storage backend, one remote API client,
//! and the state modules wired over them; there are no globals.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::net::{ApiError, HttpApi, RemoteApi};
use crate::state::auth::AuthCoordinator;
use crate::state::contacts::ContactBook;
use crate::state::notices::Notices;
use crate::state::profile::Account;
use crate::state::session::SessionStore;
use crate::storage::{FileStorage, Storage};

pub struct AppContext {
    pub session: SessionStore,
    pub auth: Arc<AuthCoordinator>,
    pub contacts: ContactBook,
    pub account: Account,
    pub notices: Notices,
}

impl AppContext {
    /// Wire the context over a file-backed store and the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage_path.clone()));
        Self::with_storage(config, storage)
    }

    /// Like [`from_config`](Self::from_config) with a caller-supplied store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let session = SessionStore::new(storage.clone());
        let api = Arc::new(HttpApi::new(config, session)?);
        tracing::debug!(api_url = %api.base_url(), path = %config.storage_path.display(), "client context ready");
        Ok(Self::with_parts(api, storage, config.page_size))
    }

    #[must_use]
    pub fn with_parts(api: Arc<dyn RemoteApi>, storage: Arc<dyn Storage>, page_size: u32) -> Self {
        let session = SessionStore::new(storage);
        let notices = Notices::new();
        let auth = Arc::new(AuthCoordinator::new(api.clone(), session.clone()));
        let contacts = ContactBook::new(api.clone(), auth.clone(), notices.clone(), page_size);
        let account = Account::new(api, auth.clone(), session.clone(), notices.clone());
        Self { session, auth, contacts, account, notices }
    }
}
