use std::sync::{Mutex, MutexGuard, PoisonError};

use super::*;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// # Safety
/// Callers must hold [`env_lock`].
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("CONTACTDESK_API_URL");
        std::env::remove_var("CONTACTDESK_STORAGE_PATH");
        std::env::remove_var("CONTACTDESK_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CONTACTDESK_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("CONTACTDESK_PAGE_SIZE");
    }
}

#[test]
fn from_env_defaults() {
    let _env = env_lock();
    unsafe {
        clear_client_env();
        std::env::set_var("CONTACTDESK_STORAGE_PATH", "/tmp/contactdesk-test/storage.json");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.storage_path, PathBuf::from("/tmp/contactdesk-test/storage.json"));
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);

    unsafe { clear_client_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _env = env_lock();
    unsafe {
        clear_client_env();
        std::env::set_var("CONTACTDESK_API_URL", "https://contacts.example.test/api/");
        std::env::set_var("CONTACTDESK_STORAGE_PATH", "/tmp/other.json");
        std::env::set_var("CONTACTDESK_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("CONTACTDESK_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("CONTACTDESK_PAGE_SIZE", "25");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://contacts.example.test/api");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.page_size, 25);

    unsafe { clear_client_env() };
}

#[test]
fn from_env_bad_timeout_falls_back() {
    let _env = env_lock();
    unsafe {
        clear_client_env();
        std::env::set_var("CONTACTDESK_STORAGE_PATH", "/tmp/x.json");
        std::env::set_var("CONTACTDESK_REQUEST_TIMEOUT_SECS", "soon");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_REQUEST_TIMEOUT_SECS);

    unsafe { clear_client_env() };
}

#[test]
fn zero_page_size_rejected() {
    let err = parse_page_size(Some("0")).unwrap_err().to_string();
    assert!(err.contains("CONTACTDESK_PAGE_SIZE"));
}

#[test]
fn garbage_page_size_rejected() {
    assert!(matches!(parse_page_size(Some("lots")), Err(ConfigError::Invalid { .. })));
}

#[test]
fn missing_page_size_uses_default() {
    assert_eq!(parse_page_size(None).unwrap(), DEFAULT_PAGE_SIZE);
}

#[test]
fn normalize_strips_trailing_slashes() {
    assert_eq!(normalize_api_url(" http://h/api// "), "http://h/api");
}
