//! Scriptable in-memory [`RemoteApi`] shared by state tests.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::net::types::{
    Ack, Contact, ContactData, ContactId, Identity, LoginRequest, LoginResponse, Page, PageRequest, PasswordChange,
    ProfileUpdate, RegisterRequest, RegisterResponse, UserId,
};
use crate::net::{ApiError, RemoteApi};
use crate::state::session::SessionStore;
use crate::storage::MemoryStorage;

pub fn network_drop() -> ApiError {
    ApiError::Network("connection reset".into())
}

pub fn rejected() -> ApiError {
    ApiError::Unauthorized { status: 401, message: "Invalid token".into() }
}

pub fn identity(id: i64, email: &str) -> Identity {
    Identity {
        id: Some(UserId(id)),
        first_name: Some("Test".into()),
        last_name: Some("User".into()),
        email: Some(email.into()),
        phone_number: None,
    }
}

pub fn contact(id: i64, first: &str, last: &str) -> Contact {
    Contact {
        id: ContactId(id),
        first_name: first.into(),
        last_name: last.into(),
        title: None,
        phone_numbers: Vec::new(),
        email_addresses: Vec::new(),
        tags: Vec::new(),
        profile_image: None,
        is_favorite: false,
    }
}

pub fn memory_session() -> (Arc<MemoryStorage>, SessionStore) {
    let storage = Arc::new(MemoryStorage::new());
    (storage.clone(), SessionStore::new(storage))
}

struct Script {
    login: Result<LoginResponse, ApiError>,
    profile: Result<Identity, ApiError>,
    register: Result<RegisterResponse, ApiError>,
    update_profile: Option<ApiError>,
    change_password: Result<Ack, ApiError>,
    delete_account: Result<Ack, ApiError>,
    contacts: Vec<Contact>,
    list_error: Option<ApiError>,
    write_error: Option<ApiError>,
    favorite_error: Option<ApiError>,
    favorite_gate: Option<oneshot::Receiver<()>>,
    calls: Vec<String>,
}

/// Backend double. Contacts are held server-side so list/create/update/
/// delete behave like the real API; every other endpoint is scripted.
pub struct MockApi {
    script: Mutex<Script>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                login: Ok(LoginResponse { token: "tok-1".into(), token_type: None, user_id: None, email: None }),
                profile: Ok(identity(1, "a@b.com")),
                register: Ok(RegisterResponse {
                    message: Some("User registered successfully".into()),
                    user_id: Some("1".into()),
                }),
                update_profile: None,
                change_password: Ok(Ack { message: Some("Password changed successfully".into()) }),
                delete_account: Ok(Ack::default()),
                contacts: Vec::new(),
                list_error: None,
                write_error: None,
                favorite_error: None,
                favorite_gate: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn set_login(&self, result: Result<LoginResponse, ApiError>) {
        self.script.lock().unwrap().login = result;
    }

    pub fn set_token(&self, token: &str) {
        self.set_login(Ok(LoginResponse { token: token.into(), token_type: None, user_id: None, email: None }));
    }

    pub fn set_profile(&self, result: Result<Identity, ApiError>) {
        self.script.lock().unwrap().profile = result;
    }

    pub fn set_register(&self, result: Result<RegisterResponse, ApiError>) {
        self.script.lock().unwrap().register = result;
    }

    pub fn fail_update_profile(&self, err: ApiError) {
        self.script.lock().unwrap().update_profile = Some(err);
    }

    pub fn set_change_password(&self, result: Result<Ack, ApiError>) {
        self.script.lock().unwrap().change_password = result;
    }

    pub fn set_delete_account(&self, result: Result<Ack, ApiError>) {
        self.script.lock().unwrap().delete_account = result;
    }

    pub fn set_contacts(&self, contacts: Vec<Contact>) {
        self.script.lock().unwrap().contacts = contacts;
    }

    pub fn server_contacts(&self) -> Vec<Contact> {
        self.script.lock().unwrap().contacts.clone()
    }

    pub fn fail_list(&self, err: Option<ApiError>) {
        self.script.lock().unwrap().list_error = err;
    }

    pub fn fail_writes(&self, err: Option<ApiError>) {
        self.script.lock().unwrap().write_error = err;
    }

    pub fn fail_favorite(&self, err: Option<ApiError>) {
        self.script.lock().unwrap().favorite_error = err;
    }

    /// Hold the next favorite toggle until the returned sender fires.
    pub fn gate_favorite(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.script.lock().unwrap().favorite_gate = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.script.lock().unwrap().calls.push(name.to_owned());
    }

    fn write_guard(&self) -> Result<(), ApiError> {
        match &self.script.lock().unwrap().write_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn page(contacts: Vec<Contact>, page: PageRequest) -> Page<Contact> {
        let total = contacts.len();
        let size = page.size.max(1) as usize;
        let content = contacts.into_iter().skip(page.page as usize * size).take(size).collect();
        Page {
            content,
            total_elements: total as u64,
            total_pages: total.div_ceil(size) as u32,
            number: page.page,
            size: page.size,
        }
    }
}

#[async_trait::async_trait]
impl RemoteApi for MockApi {
    async fn register(&self, _request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.record("register");
        self.script.lock().unwrap().register.clone()
    }

    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.record("login");
        self.script.lock().unwrap().login.clone()
    }

    async fn profile(&self) -> Result<Identity, ApiError> {
        self.record("profile");
        self.script.lock().unwrap().profile.clone()
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Identity, ApiError> {
        self.record("update_profile");
        let mut script = self.script.lock().unwrap();
        if let Some(err) = &script.update_profile {
            return Err(err.clone());
        }
        let mut identity = script.profile.clone().unwrap_or_default();
        identity.first_name = Some(update.first_name.clone());
        identity.last_name = Some(update.last_name.clone());
        identity.email = Some(update.email.clone());
        identity.phone_number.clone_from(&update.phone_number);
        script.profile = Ok(identity.clone());
        Ok(identity)
    }

    async fn change_password(&self, _change: &PasswordChange) -> Result<Ack, ApiError> {
        self.record("change_password");
        self.script.lock().unwrap().change_password.clone()
    }

    async fn delete_account(&self) -> Result<Ack, ApiError> {
        self.record("delete_account");
        self.script.lock().unwrap().delete_account.clone()
    }

    async fn list_contacts(&self, page: PageRequest) -> Result<Page<Contact>, ApiError> {
        self.record("list_contacts");
        let script = self.script.lock().unwrap();
        if let Some(err) = &script.list_error {
            return Err(err.clone());
        }
        Ok(Self::page(script.contacts.clone(), page))
    }

    async fn search_contacts(&self, query: &str, page: PageRequest) -> Result<Page<Contact>, ApiError> {
        self.record("search_contacts");
        let script = self.script.lock().unwrap();
        if let Some(err) = &script.list_error {
            return Err(err.clone());
        }
        let needle = query.to_lowercase();
        let hits = script.contacts.iter().filter(|c| c.full_name().to_lowercase().contains(&needle)).cloned().collect();
        Ok(Self::page(hits, page))
    }

    async fn get_contact(&self, id: ContactId) -> Result<Contact, ApiError> {
        self.record("get_contact");
        self.script
            .lock()
            .unwrap()
            .contacts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ApiError::Validation { status: 404, message: format!("Contact not found with id: {id}") })
    }

    async fn create_contact(&self, data: &ContactData) -> Result<Contact, ApiError> {
        self.record("create_contact");
        self.write_guard()?;
        let mut script = self.script.lock().unwrap();
        let next = script.contacts.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        let created = from_data(ContactId(next), data);
        script.contacts.push(created.clone());
        Ok(created)
    }

    async fn update_contact(&self, id: ContactId, data: &ContactData) -> Result<Contact, ApiError> {
        self.record("update_contact");
        self.write_guard()?;
        let mut script = self.script.lock().unwrap();
        let slot = script
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiError::Validation { status: 404, message: "Contact not found".into() })?;
        *slot = from_data(id, data);
        Ok(slot.clone())
    }

    async fn delete_contact(&self, id: ContactId) -> Result<Ack, ApiError> {
        self.record("delete_contact");
        self.write_guard()?;
        self.script.lock().unwrap().contacts.retain(|c| c.id != id);
        Ok(Ack { message: Some("Contact deleted successfully".into()) })
    }

    async fn toggle_favorite(&self, id: ContactId) -> Result<Contact, ApiError> {
        self.record("toggle_favorite");
        let gate = self.script.lock().unwrap().favorite_gate.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let mut script = self.script.lock().unwrap();
        if let Some(err) = &script.favorite_error {
            return Err(err.clone());
        }
        let slot = script
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ApiError::Validation { status: 404, message: "Contact not found".into() })?;
        slot.is_favorite = !slot.is_favorite;
        Ok(slot.clone())
    }
}

fn from_data(id: ContactId, data: &ContactData) -> Contact {
    Contact {
        id,
        first_name: data.first_name.clone(),
        last_name: data.last_name.clone(),
        title: data.title.clone(),
        phone_numbers: data.phone_numbers.clone(),
        email_addresses: data.email_addresses.clone(),
        tags: data.tags.clone(),
        profile_image: data.profile_image.clone(),
        is_favorite: data.is_favorite,
    }
}
