//! The signed-in user's own account: profile fields, password, account
//! deletion, and the locally cached profile image.
//!
//! Form validation runs before any request is sent and reports through the
//! same notice channel as backend failures. The profile image never leaves
//! the device; it is stored as a data URL in the Session Store under the
//! current identity's id.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use super::auth::AuthCoordinator;
use super::notices::Notices;
use super::session::SessionStore;
use crate::net::types::{Identity, PasswordChange, ProfileUpdate, UserId};
use crate::net::{ApiError, RemoteApi};
use crate::storage::StorageError;

/// Largest accepted profile image, in raw bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MIN_PASSWORD_LEN: usize = 6;

pub const PROFILE_UPDATED_MESSAGE: &str = "Profile updated successfully!";
pub const PASSWORD_CHANGED_MESSAGE: &str = "Password changed successfully!";
pub const ACCOUNT_DELETED_MESSAGE: &str = "Account deleted successfully";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A form field failed client-side validation.
    #[error("{0}")]
    Invalid(&'static str),

    #[error("Image size should be less than 5MB")]
    ImageTooLarge { size: usize },

    #[error("no signed-in user to attach the image to")]
    MissingIdentity,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Password change form, including the confirmation field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Check and trim a profile update. An empty phone number becomes `None`.
///
/// # Errors
///
/// Returns [`ProfileError::Invalid`] naming the first failing field.
pub fn validate_profile(update: &ProfileUpdate) -> Result<ProfileUpdate, ProfileError> {
    let first_name = update.first_name.trim();
    let last_name = update.last_name.trim();
    let email = update.email.trim();
    if first_name.is_empty() {
        return Err(ProfileError::Invalid("First name is required"));
    }
    if last_name.is_empty() {
        return Err(ProfileError::Invalid("Last name is required"));
    }
    if email.is_empty() {
        return Err(ProfileError::Invalid("Email is required"));
    }
    if !looks_like_email(email) {
        return Err(ProfileError::Invalid("Please enter a valid email address"));
    }
    Ok(ProfileUpdate {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: email.to_owned(),
        phone_number: update.phone_number.as_deref().map(str::trim).filter(|p| !p.is_empty()).map(str::to_owned),
    })
}

/// Check a password form and build the request body.
///
/// # Errors
///
/// Returns [`ProfileError::Invalid`] for the first failing rule.
pub fn validate_password(form: &PasswordForm) -> Result<PasswordChange, ProfileError> {
    if form.current_password.is_empty() {
        return Err(ProfileError::Invalid("Please enter your current password"));
    }
    if form.new_password.is_empty() {
        return Err(ProfileError::Invalid("Please enter a new password"));
    }
    if form.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ProfileError::Invalid("Password must be at least 6 characters long"));
    }
    if form.new_password != form.confirm_password {
        return Err(ProfileError::Invalid("New passwords do not match"));
    }
    if form.new_password == form.current_password {
        return Err(ProfileError::Invalid("New password must be different from current password"));
    }
    Ok(PasswordChange { current_password: form.current_password.clone(), new_password: form.new_password.clone() })
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain.char_indices().any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Encode raw image bytes as a `data:` URL.
#[must_use]
pub fn to_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

// =============================================================================
// ACCOUNT
// =============================================================================

pub struct Account {
    api: Arc<dyn RemoteApi>,
    auth: Arc<AuthCoordinator>,
    session: SessionStore,
    notices: Notices,
}

impl Account {
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>, auth: Arc<AuthCoordinator>, session: SessionStore, notices: Notices) -> Self {
        Self { api, auth, session, notices }
    }

    /// Re-fetch the profile for display.
    ///
    /// # Errors
    ///
    /// Returns the backend error after posting a notice.
    pub async fn load(&self) -> Result<Identity, ApiError> {
        let identity = self.auth.guard(self.api.profile().await).inspect_err(|e| {
            tracing::warn!(error = %e, "profile load failed");
            self.notices.error("Failed to load profile data");
        })?;
        self.auth.set_identity(identity.clone());
        Ok(identity)
    }

    /// Validate and submit a profile update. The returned identity replaces
    /// the coordinator's.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend error after posting it as a notice.
    pub async fn update(&self, update: &ProfileUpdate) -> Result<Identity, ProfileError> {
        let update = self.checked(validate_profile(update))?;
        let updated = self.submit(self.api.update_profile(&update).await, "Failed to update profile")?;
        tracing::info!(user_id = ?updated.id, "profile updated");
        self.auth.set_identity(updated.clone());
        self.notices.success(PROFILE_UPDATED_MESSAGE);
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns the validation or backend error after posting it as a notice.
    pub async fn change_password(&self, form: &PasswordForm) -> Result<(), ProfileError> {
        let change = self.checked(validate_password(form))?;
        self.submit(self.api.change_password(&change).await, "Failed to change password")?;
        tracing::info!("password changed");
        self.notices.success(PASSWORD_CHANGED_MESSAGE);
        Ok(())
    }

    /// Delete the account, wipe local storage, and log out.
    ///
    /// # Errors
    ///
    /// Returns the backend error after posting it as a notice; nothing local
    /// is touched in that case.
    pub async fn delete(&self) -> Result<(), ProfileError> {
        self.submit(self.api.delete_account().await, "Failed to delete account")?;
        tracing::info!("account deleted");
        self.notices.success(ACCOUNT_DELETED_MESSAGE);
        self.session.clear_all();
        self.auth.logout();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Profile image
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn image(&self) -> Option<String> {
        self.auth.profile_image()
    }

    /// Store an image for the current user. Returns the data URL.
    ///
    /// # Errors
    ///
    /// `ImageTooLarge` above [`MAX_IMAGE_BYTES`], `MissingIdentity` when the
    /// current user's id is unknown, or the storage error.
    pub async fn set_image(&self, bytes: &[u8], mime: &str) -> Result<String, ProfileError> {
        if bytes.len() > MAX_IMAGE_BYTES {
            let err = ProfileError::ImageTooLarge { size: bytes.len() };
            self.notices.error(err.to_string());
            return Err(err);
        }
        let user_id = self.current_user_id("Failed to save profile image").await?;
        let data_url = to_data_url(bytes, mime);
        self.session.save_artifact(user_id, &data_url).map_err(|e| self.storage_failed(e, "Failed to save profile image"))?;
        tracing::info!(%user_id, size = bytes.len(), "profile image stored");
        Ok(data_url)
    }

    /// Remove the current user's image. Other users' images are untouched.
    ///
    /// # Errors
    ///
    /// `MissingIdentity` when the current user's id is unknown, or the
    /// storage error.
    pub async fn remove_image(&self) -> Result<(), ProfileError> {
        let user_id = self.current_user_id("Failed to remove profile image").await?;
        self.session.clear_artifact(user_id).map_err(|e| self.storage_failed(e, "Failed to remove profile image"))?;
        tracing::info!(%user_id, "profile image removed");
        Ok(())
    }

    async fn current_user_id(&self, failure: &str) -> Result<UserId, ProfileError> {
        match self.auth.refresh_identity().await.and_then(|i| i.id) {
            Some(id) => Ok(id),
            None => {
                self.notices.error(failure);
                Err(ProfileError::MissingIdentity)
            }
        }
    }

    fn storage_failed(&self, e: StorageError, message: &str) -> ProfileError {
        tracing::warn!(error = %e, "profile image storage failed");
        self.notices.error(message);
        ProfileError::Storage(e)
    }

    fn checked<T>(&self, result: Result<T, ProfileError>) -> Result<T, ProfileError> {
        result.inspect_err(|e| self.notices.error(e.to_string()))
    }

    fn submit<T>(&self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ProfileError> {
        self.auth.guard(result).map_err(|e| {
            tracing::warn!(error = %e, "account request failed");
            self.notices.error(e.user_message(fallback));
            ProfileError::Api(e)
        })
    }
}
