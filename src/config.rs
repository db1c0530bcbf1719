//! Client configuration parsed from environment variables.

use std::path::PathBuf;

use directories::ProjectDirs;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const STORAGE_FILE_NAME: &str = "storage.json";

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "contactdesk";
const APP_NAME: &str = "contactdesk";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No platform data directory and no explicit storage path.
    #[error("cannot determine data directory; set CONTACTDESK_STORAGE_PATH")]
    NoDataDir,

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub storage_path: PathBuf,
    pub timeouts: Timeouts,
    pub page_size: u32,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `CONTACTDESK_API_URL`: default `http://localhost:8080/api`
    /// - `CONTACTDESK_STORAGE_PATH`: default `<data dir>/storage.json`
    /// - `CONTACTDESK_REQUEST_TIMEOUT_SECS`: default 30
    /// - `CONTACTDESK_CONNECT_TIMEOUT_SECS`: default 10
    /// - `CONTACTDESK_PAGE_SIZE`: default 100, must be non-zero
    ///
    /// # Errors
    ///
    /// Returns an error if no storage location can be determined or the page
    /// size is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(&std::env::var("CONTACTDESK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned()));

        let storage_path = match std::env::var("CONTACTDESK_STORAGE_PATH") {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_storage_path()?,
        };

        let timeouts = Timeouts {
            request_secs: env_parse_u64("CONTACTDESK_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse_u64("CONTACTDESK_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let page_size = parse_page_size(std::env::var("CONTACTDESK_PAGE_SIZE").ok().as_deref())?;

        Ok(Self { api_url, storage_path, timeouts, page_size })
    }
}

/// Trim whitespace and trailing slashes so paths can be appended with `/`.
#[must_use]
pub fn normalize_api_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

/// `<platform data dir>/storage.json`.
///
/// # Errors
///
/// Returns [`ConfigError::NoDataDir`] when the platform exposes no home.
pub fn default_storage_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join(STORAGE_FILE_NAME))
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn parse_page_size(raw: Option<&str>) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_PAGE_SIZE);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::Invalid { var: "CONTACTDESK_PAGE_SIZE", reason: "must be at least 1".into() }),
        Ok(size) => Ok(size),
        Err(e) => Err(ConfigError::Invalid { var: "CONTACTDESK_PAGE_SIZE", reason: e.to_string() }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
