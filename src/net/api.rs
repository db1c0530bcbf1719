//! REST client for the contact-management backend.
//!
//! `RemoteApi` is the seam between client state and the network: state
//! modules depend on the trait, `HttpApi` implements it over `reqwest`, and
//! tests substitute an in-memory mock.
//!
//! ERROR HANDLING
//! ==============
//! Every non-2xx response is classified into [`ApiError`] here, with the
//! backend's message extracted from the body. Callers never inspect raw
//! status codes.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::time::Duration;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::types::{
    Ack, Contact, ContactData, ContactId, Identity, LoginRequest, LoginResponse, Page, PageRequest, PasswordChange,
    ProfileUpdate, RegisterRequest, RegisterResponse,
};
use crate::config::ClientConfig;
use crate::state::session::SessionStore;

/// Operations offered by the remote API. Paths are relative to the API base.
#[async_trait::async_trait]
pub trait RemoteApi: Send + Sync {
    /// `POST /auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError>;

    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `GET /user/profile`
    async fn profile(&self) -> Result<Identity, ApiError>;

    /// `PUT /user/profile`
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, ApiError>;

    /// `PUT /user/change-password`
    async fn change_password(&self, change: &PasswordChange) -> Result<Ack, ApiError>;

    /// `DELETE /user/account`
    async fn delete_account(&self) -> Result<Ack, ApiError>;

    /// `GET /contacts?page&size&sortBy`
    async fn list_contacts(&self, page: PageRequest) -> Result<Page<Contact>, ApiError>;

    /// `GET /contacts/search?query&page&size`
    async fn search_contacts(&self, query: &str, page: PageRequest) -> Result<Page<Contact>, ApiError>;

    /// `GET /contacts/:id`
    async fn get_contact(&self, id: ContactId) -> Result<Contact, ApiError>;

    /// `POST /contacts`
    async fn create_contact(&self, data: &ContactData) -> Result<Contact, ApiError>;

    /// `PUT /contacts/:id`
    async fn update_contact(&self, id: ContactId, data: &ContactData) -> Result<Contact, ApiError>;

    /// `DELETE /contacts/:id`
    async fn delete_contact(&self, id: ContactId) -> Result<Ack, ApiError>;

    /// `PATCH /contacts/:id/favorite`
    async fn toggle_favorite(&self, id: ContactId) -> Result<Contact, ApiError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

/// `reqwest`-backed [`RemoteApi`]. Reads the credential from the session
/// store on every call, so a login or logout takes effect immediately.
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
}

impl HttpApi {
    /// Build a client for `config.api_url` with the configured timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_url.clone(), session })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        authenticated: bool,
    ) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method.clone(), self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if authenticated {
            if let Some(credential) = self.session.load_credential() {
                request = request.bearer_auth(credential.as_str());
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        if !(200..300).contains(&status) {
            let err = ApiError::from_status(status, &text);
            tracing::debug!(%method, path, status, error = %err, "api call failed");
            return Err(err);
        }

        decode_body(&text)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        self.send::<(), T>(Method::GET, path, query, None, true).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.send(method, path, &[], Some(body), true).await
    }

    async fn without_body<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ApiError> {
        self.send::<(), T>(method, path, &[], None, true).await
    }
}

/// Decode a success body. An empty body (`204`, or a bare `200`) decodes as
/// `{}` so acknowledgement types fall back to their defaults.
fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

fn page_query(page: PageRequest) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.page.to_string()),
        ("size", page.size.to_string()),
        ("sortBy", page.sort_by.as_param().to_owned()),
    ]
}

#[async_trait::async_trait]
impl RemoteApi for HttpApi {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.send(Method::POST, "/auth/register", &[], Some(request), false).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.send(Method::POST, "/auth/login", &[], Some(request), false).await
    }

    async fn profile(&self) -> Result<Identity, ApiError> {
        self.get("/user/profile", &[]).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, ApiError> {
        self.with_body(Method::PUT, "/user/profile", update).await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<Ack, ApiError> {
        self.with_body(Method::PUT, "/user/change-password", change).await
    }

    async fn delete_account(&self) -> Result<Ack, ApiError> {
        self.without_body(Method::DELETE, "/user/account").await
    }

    async fn list_contacts(&self, page: PageRequest) -> Result<Page<Contact>, ApiError> {
        self.get("/contacts", &page_query(page)).await
    }

    async fn search_contacts(&self, query: &str, page: PageRequest) -> Result<Page<Contact>, ApiError> {
        let params = vec![
            ("query", query.to_owned()),
            ("page", page.page.to_string()),
            ("size", page.size.to_string()),
        ];
        self.get("/contacts/search", &params).await
    }

    async fn get_contact(&self, id: ContactId) -> Result<Contact, ApiError> {
        self.get(&format!("/contacts/{id}"), &[]).await
    }

    async fn create_contact(&self, data: &ContactData) -> Result<Contact, ApiError> {
        self.with_body(Method::POST, "/contacts", data).await
    }

    async fn update_contact(&self, id: ContactId, data: &ContactData) -> Result<Contact, ApiError> {
        self.with_body(Method::PUT, &format!("/contacts/{id}"), data).await
    }

    async fn delete_contact(&self, id: ContactId) -> Result<Ack, ApiError> {
        self.without_body(Method::DELETE, &format!("/contacts/{id}")).await
    }

    async fn toggle_favorite(&self, id: ContactId) -> Result<Contact, ApiError> {
        self.without_body(Method::PATCH, &format!("/contacts/{id}/favorite")).await
    }
}
