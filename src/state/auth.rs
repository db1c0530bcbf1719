//! Authentication coordinator.
//!
//! DESIGN
//! ======
//! `AuthCoordinator` owns the tri-state [`AuthState`] signal and the current
//! [`Identity`], both published through `tokio::sync::watch` so views can
//! subscribe read-only. The credential itself lives in the [`SessionStore`];
//! the coordinator keeps the two consistent:
//!
//! - `Unknown` only before [`AuthCoordinator::initialize`] completes; no
//!   operation ever moves back to it.
//! - Storage is always cleared before the signal flips to
//!   `Unauthenticated`, so a reader never sees "authenticated" with no
//!   credential behind it.
//!
//! TRADE-OFFS
//! ==========
//! A present credential is trusted until the backend explicitly rejects it
//! with a 401-class response. Network failures while fetching the identity
//! leave the session authenticated with a missing or placeholder identity.
//! There is no cross-operation lock: overlapping login/logout calls are
//! last-write-wins.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::session::{Credential, SessionStore};
use crate::net::types::{Identity, LoginRequest, RegisterRequest, RegisterResponse};
use crate::net::{ApiError, RemoteApi};
use crate::storage::StorageError;

/// Tri-state authentication signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Startup check still running.
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// What a protected view should do for the current [`AuthState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteAccess {
    /// Render a neutral loading state; never flash unauthenticated content.
    Loading,
    Allowed,
    RedirectToLogin,
}

impl From<AuthState> for RouteAccess {
    fn from(state: AuthState) -> Self {
        match state {
            AuthState::Unknown => Self::Loading,
            AuthState::Authenticated => Self::Allowed,
            AuthState::Unauthenticated => Self::RedirectToLogin,
        }
    }
}

pub struct AuthCoordinator {
    api: Arc<dyn RemoteApi>,
    session: SessionStore,
    state: watch::Sender<AuthState>,
    identity: watch::Sender<Option<Identity>>,
}

impl AuthCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>, session: SessionStore) -> Self {
        Self {
            api,
            session,
            state: watch::Sender::new(AuthState::Unknown),
            identity: watch::Sender::new(None),
        }
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Read-only view of the authentication signal.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Read-only view of the identity signal.
    #[must_use]
    pub fn subscribe_identity(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    #[must_use]
    pub fn route_access(&self) -> RouteAccess {
        self.state().into()
    }

    /// Wait until the startup check has settled the state.
    pub async fn settled(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|s| *s != AuthState::Unknown).await {
            Ok(state) => *state,
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        }
    }

    /// The current user's cached profile image. Looked up strictly under the
    /// current identity's id; a session with no known id has no image.
    #[must_use]
    pub fn profile_image(&self) -> Option<String> {
        let user_id = self.identity.borrow().as_ref()?.id?;
        self.session.load_artifact(user_id)
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Startup check. Runs once; later calls return the settled state
    /// without touching storage or the network.
    pub async fn initialize(&self) -> AuthState {
        if self.state() != AuthState::Unknown {
            return self.state();
        }

        if self.session.load_credential().is_none() {
            tracing::debug!("no stored credential");
            self.identity.send_replace(None);
            self.state.send_replace(AuthState::Unauthenticated);
            return AuthState::Unauthenticated;
        }

        self.state.send_replace(AuthState::Authenticated);
        match self.api.profile().await {
            Ok(identity) => {
                tracing::info!(user_id = ?identity.id, "session restored");
                self.identity.send_replace(Some(identity));
            }
            Err(e) if e.is_unauthorized() => {
                tracing::info!(error = %e, "stored credential rejected");
                self.expire();
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch failed; keeping session");
            }
        }
        self.state()
    }

    /// Log in and load the identity.
    ///
    /// If the identity fetch fails for any reason other than the new
    /// credential being rejected, a placeholder built from the login
    /// identifier is installed instead.
    ///
    /// # Errors
    ///
    /// Returns the login error (state is forced to `Unauthenticated` and the
    /// credential cleared), `Storage` if the credential cannot be persisted
    /// (state is forced to `Unauthenticated`), or `Unauthorized` if the
    /// backend rejects the freshly issued credential.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<Identity, ApiError> {
        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(error = %e, "login failed");
                self.session.clear_credential();
                self.identity.send_replace(None);
                self.state.send_replace(AuthState::Unauthenticated);
                return Err(e);
            }
        };

        self.session.save_credential(&Credential::new(response.token));
        if self.session.load_credential().is_none() {
            tracing::warn!("credential not persisted; login abandoned");
            self.identity.send_replace(None);
            self.state.send_replace(AuthState::Unauthenticated);
            return Err(ApiError::Storage(StorageError::Unavailable));
        }
        self.state.send_replace(AuthState::Authenticated);

        let identity = match self.api.profile().await {
            Ok(identity) => identity,
            Err(e) if e.is_unauthorized() => {
                self.expire();
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch after login failed; using placeholder");
                Identity::placeholder(&credentials.username)
            }
        };
        tracing::info!(user_id = ?identity.id, "logged in");
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Create an account. Does not start a session.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        let response = self.api.register(request).await?;
        tracing::info!(email = %request.email, "registered");
        Ok(response)
    }

    /// Clear the credential and every cached artifact, then signal
    /// `Unauthenticated`.
    pub fn logout(&self) {
        self.session.clear_credential();
        let purged = self.session.clear_all_artifacts();
        self.identity.send_replace(None);
        self.state.send_replace(AuthState::Unauthenticated);
        tracing::info!(purged, "logged out");
    }

    /// Implicit logout after the backend rejected the credential.
    pub fn expire(&self) {
        tracing::info!("session expired");
        self.logout();
    }

    /// Pass a result through, expiring the session on a 401-class error.
    ///
    /// # Errors
    ///
    /// Returns `result`'s error unchanged.
    pub fn guard<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                self.expire();
            }
        }
        result
    }

    /// Re-fetch the identity. Failures are logged and leave the current
    /// identity in place.
    pub async fn refresh_identity(&self) -> Option<Identity> {
        match self.guard(self.api.profile().await) {
            Ok(identity) => {
                self.identity.send_replace(Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity refresh failed");
                self.identity()
            }
        }
    }

    /// Replace the identity after a successful profile update.
    pub fn set_identity(&self, identity: Identity) {
        self.identity.send_replace(Some(identity));
    }
}
