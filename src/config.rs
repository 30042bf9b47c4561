//! Client and edge configuration parsed from environment variables.

use std::path::PathBuf;

use crate::net::transport::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, Timeouts};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_EDGE_PORT: u16 = 3000;
pub const DEFAULT_SITE_DIR: &str = "site";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub timeouts: Timeouts,
    /// Mark the session cookie mirror `Secure`.
    pub cookie_secure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { api_url: DEFAULT_API_URL.to_owned(), timeouts: Timeouts::default(), cookie_secure: false }
    }
}

impl ClientConfig {
    /// Build client config from environment variables.
    ///
    /// - `FINSIGHT_API_URL`: default `http://localhost:8000`
    /// - `FINSIGHT_REQUEST_TIMEOUT_SECS`: default 30
    /// - `FINSIGHT_CONNECT_TIMEOUT_SECS`: default 10
    /// - `COOKIE_SECURE`: default false
    #[must_use]
    pub fn from_env() -> Self {
        let api_url = std::env::var("FINSIGHT_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        Self {
            api_url: normalize_base_url(&api_url),
            timeouts: Timeouts {
                request_secs: env_parse("FINSIGHT_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("FINSIGHT_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            cookie_secure: env_bool("COOKIE_SECURE").unwrap_or(false),
        }
    }

    /// Override the API base URL, e.g. from a CLI flag.
    #[must_use]
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = normalize_base_url(api_url);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeConfig {
    pub port: u16,
    pub site_dir: PathBuf,
}

impl EdgeConfig {
    /// Build edge config from environment variables.
    ///
    /// - `PORT`: default 3000
    /// - `SITE_DIR`: default `./site`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_EDGE_PORT),
            site_dir: std::env::var("SITE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_SITE_DIR), PathBuf::from),
        }
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { DEFAULT_API_URL.to_owned() } else { trimmed.to_owned() }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).unwrap_or_default();
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
