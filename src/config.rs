//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const TOKEN_FILE_NAME: &str = "session.json";

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
    /// Base URL of the authentication service, without trailing `/`.
    pub backend_url: String,
    /// Location of the persisted session document.
    pub token_file: PathBuf,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_BACKEND_URL`: default `http://localhost:3000`
    /// - `AUTH_TOKEN_FILE`: default `<data dir>/authsession/session.json`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if `AUTH_BACKEND_URL` is set but blank.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `AUTH_BACKEND_URL` resolves to a blank string.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = lookup("AUTH_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());
        let backend_url = normalize_base_url(&backend_url);
        if backend_url.is_empty() {
            return Err(ConfigError::Empty { var: "AUTH_BACKEND_URL" });
        }

        let token_file = lookup("AUTH_TOKEN_FILE")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_token_file, PathBuf::from);

        let timeouts = Timeouts {
            request_secs: parse_u64(lookup("AUTH_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_u64(lookup("AUTH_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { backend_url, token_file, timeouts })
    }

    /// Config pointing at `backend_url` with default timeouts and token file.
    #[must_use]
    pub fn with_backend(backend_url: &str) -> Self {
        Self {
            backend_url: normalize_base_url(backend_url),
            token_file: default_token_file(),
            timeouts: Timeouts::default(),
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn default_token_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "authsession").map_or_else(
        || PathBuf::from(TOKEN_FILE_NAME),
        |dirs| dirs.data_dir().join(TOKEN_FILE_NAME),
    )
}
