//! Contact list state: the current page, the selected contact, and the
//! operations that mutate them.
//!
//! DESIGN
//! ======
//! The book keeps a transient cache of one page of contacts plus a separate
//! copy of the selected contact (the detail view). Writes go to the backend
//! first and refresh the page on success; only the favorite toggle is
//! applied optimistically, through [`optimistic::run`], and it updates the
//! page and the selected copy together so the two views never disagree.
//!
//! Reads are non-critical: failures are logged and leave the cache as it
//! was. Each list/search request takes a sequence number and a response is
//! dropped if a newer request was issued after it.

#[cfg(test)]
#[path = "contacts_test.rs"]
mod contacts_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::auth::AuthCoordinator;
use super::notices::Notices;
use super::optimistic::{self, Transition};
use crate::net::types::{Contact, ContactData, ContactId, Page, PageRequest, SortBy};
use crate::net::{ApiError, RemoteApi};

pub const CREATED_MESSAGE: &str = "Contact created successfully!";
pub const DELETED_MESSAGE: &str = "Contact deleted successfully!";
pub const SAVE_FAILED_MESSAGE: &str = "Operation failed";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete contact";
pub const FAVORITE_FAILED_MESSAGE: &str = "Failed to update favorite status";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactsState {
    pub items: Vec<Contact>,
    pub selected: Option<Contact>,
    pub total: u64,
    pub loading: bool,
}

impl ContactsState {
    /// Contacts whose "first last" name contains `query`, ignoring case.
    /// An empty query matches everything.
    #[must_use]
    pub fn filter_by_name(&self, query: &str) -> Vec<&Contact> {
        self.filtered(query, false)
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<&Contact> {
        self.filtered("", true)
    }

    /// Name filter, optionally narrowed to favorites.
    #[must_use]
    pub fn filtered(&self, query: &str, favorites_only: bool) -> Vec<&Contact> {
        let needle = query.trim().to_lowercase();
        self.items
            .iter()
            .filter(|c| !favorites_only || c.is_favorite)
            .filter(|c| needle.is_empty() || format!("{} {}", c.first_name, c.last_name).to_lowercase().contains(&needle))
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: ContactId) -> Option<&Contact> {
        self.items.iter().find(|c| c.id == id)
    }

    /// Install a fetched page. Keeps the selection when it is still on the
    /// page (refreshing its copy), otherwise selects the first contact.
    fn install(&mut self, page: Page<Contact>) {
        self.total = page.total_elements;
        self.items = page.content;
        let kept = self.selected.as_ref().and_then(|s| self.items.iter().find(|c| c.id == s.id)).cloned();
        self.selected = kept.or_else(|| self.items.first().cloned());
    }
}

/// Flip `is_favorite` on one contact, in the page and in the selected copy.
/// Its own inverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToggleFavorite(pub ContactId);

impl ToggleFavorite {
    fn flip(self, state: &mut ContactsState) {
        for contact in state.items.iter_mut().filter(|c| c.id == self.0) {
            contact.is_favorite = !contact.is_favorite;
        }
        if let Some(selected) = state.selected.as_mut().filter(|s| s.id == self.0) {
            selected.is_favorite = !selected.is_favorite;
        }
    }
}

impl Transition<ContactsState> for ToggleFavorite {
    fn apply(&self, state: &mut ContactsState) {
        self.flip(state);
    }

    fn revert(&self, state: &mut ContactsState) {
        self.flip(state);
    }
}

pub struct ContactBook {
    api: Arc<dyn RemoteApi>,
    auth: Arc<AuthCoordinator>,
    notices: Notices,
    state: RwLock<ContactsState>,
    latest_request: AtomicU64,
    page_size: u32,
}

impl ContactBook {
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>, auth: Arc<AuthCoordinator>, notices: Notices, page_size: u32) -> Self {
        Self {
            api,
            auth,
            notices,
            state: RwLock::new(ContactsState::default()),
            latest_request: AtomicU64::new(0),
            page_size,
        }
    }

    /// Shared state, for views that render directly from it.
    #[must_use]
    pub fn state(&self) -> &RwLock<ContactsState> {
        &self.state
    }

    pub async fn snapshot(&self) -> ContactsState {
        self.state.read().await.clone()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Reload the first page, sorted by first name.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the cached page is left unchanged.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let page = PageRequest { page: 0, size: self.page_size, sort_by: SortBy::FirstName };
        self.load(|| self.api.list_contacts(page)).await
    }

    /// Replace the cached page with the first page of backend search
    /// results.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the cached page is left unchanged.
    pub async fn search(&self, query: &str) -> Result<(), ApiError> {
        self.load(|| self.api.search_contacts(query, PageRequest::default())).await
    }

    /// Total number of contacts, or 0 when the count cannot be fetched.
    pub async fn count(&self) -> u64 {
        let page = PageRequest { page: 0, size: 1, sort_by: SortBy::FirstName };
        match self.auth.guard(self.api.list_contacts(page).await) {
            Ok(page) => page.total_elements,
            Err(e) => {
                tracing::warn!(error = %e, "contact count unavailable");
                0
            }
        }
    }

    /// Fetch one contact straight from the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn fetch(&self, id: ContactId) -> Result<Contact, ApiError> {
        self.auth.guard(self.api.get_contact(id).await)
    }

    async fn load<F, Fut>(&self, request: F) -> Result<(), ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Page<Contact>, ApiError>>,
    {
        let seq = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().await.loading = true;

        let result = self.auth.guard(request().await);

        if self.latest_request.load(Ordering::SeqCst) != seq {
            tracing::debug!(seq, "discarding superseded contact page");
            return Ok(());
        }

        let mut state = self.state.write().await;
        state.loading = false;
        match result {
            Ok(page) => {
                tracing::debug!(count = page.content.len(), total = page.total_elements, "contacts loaded");
                state.install(page);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "contact list fetch failed");
                Err(e)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    /// Select a contact on the current page. Returns `false` if absent.
    pub async fn select(&self, id: ContactId) -> bool {
        let mut state = self.state.write().await;
        let found = state.find(id).cloned();
        let hit = found.is_some();
        if hit {
            state.selected = found;
        }
        hit
    }

    pub async fn clear_selection(&self) {
        self.state.write().await.selected = None;
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Create a contact, then refresh the page.
    ///
    /// # Errors
    ///
    /// Returns the backend error after posting it as a notice.
    pub async fn create(&self, data: &ContactData) -> Result<Contact, ApiError> {
        let created = self.write(self.api.create_contact(data).await, SAVE_FAILED_MESSAGE)?;
        tracing::info!(contact_id = %created.id, "contact created");
        self.notices.success(CREATED_MESSAGE);
        self.refresh_quietly().await;
        Ok(created)
    }

    /// Update a contact, then refresh the page.
    ///
    /// # Errors
    ///
    /// Returns the backend error after posting it as a notice.
    pub async fn update(&self, id: ContactId, data: &ContactData) -> Result<Contact, ApiError> {
        let updated = self.write(self.api.update_contact(id, data).await, SAVE_FAILED_MESSAGE)?;
        tracing::info!(contact_id = %id, "contact updated");
        self.refresh_quietly().await;
        Ok(updated)
    }

    /// Delete a contact, clear the selection, then refresh the page.
    ///
    /// # Errors
    ///
    /// Returns the backend error after posting it as a notice.
    pub async fn delete(&self, id: ContactId) -> Result<(), ApiError> {
        self.write(self.api.delete_contact(id).await, DELETE_FAILED_MESSAGE)?;
        tracing::info!(contact_id = %id, "contact deleted");
        self.notices.success(DELETED_MESSAGE);
        self.clear_selection().await;
        self.refresh_quietly().await;
        Ok(())
    }

    /// Flip a contact's favorite flag optimistically.
    ///
    /// # Errors
    ///
    /// Returns the backend error after rolling back and posting a notice.
    pub async fn toggle_favorite(&self, id: ContactId) -> Result<(), ApiError> {
        optimistic::run(&self.state, &self.notices, &ToggleFavorite(id), FAVORITE_FAILED_MESSAGE, || async {
            self.auth.guard(self.api.toggle_favorite(id).await)
        })
        .await
        .map(|_| ())
    }

    fn write<T>(&self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ApiError> {
        self.auth.guard(result).inspect_err(|e| {
            tracing::warn!(error = %e, "contact write failed");
            self.notices.error(e.user_message(fallback));
        })
    }

    async fn refresh_quietly(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "post-write refresh failed");
        }
    }
}
