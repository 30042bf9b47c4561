//! Durable session storage and its cookie mirror.
//!
//! SYSTEM CONTEXT
//! ==============
//! The bearer token and user profile live in a durable key/value store. The
//! token is duplicated into the `auth_token` cookie because the edge route
//! guard runs before any page code and can only see cookies. Both copies of
//! the token are written by [`PersistedSessionStore::set_token`] and nowhere
//! else, so they cannot drift apart.
//!
//! ERROR HANDLING
//! ==============
//! Nothing here returns an error. A stored user that no longer parses is
//! deleted and reported as absent.

pub mod backend;
pub mod file;

use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::net::types::User;
pub use backend::{CookieMirror, KeyValueStore, MemoryCookieJar, MemoryStore};
pub use file::{FileCookieJar, FileStore};

/// Durable key holding the raw bearer token.
pub const TOKEN_KEY: &str = "auth_token";
/// Durable key holding the JSON-serialized [`User`].
pub const USER_KEY: &str = "user_data";
/// Cookie mirroring token presence for the edge guard.
pub const COOKIE_NAME: &str = "auth_token";
pub const COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Cookie written alongside a freshly stored token.
#[must_use]
pub fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token.to_owned()))
        .path("/")
        .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

/// Already-expired cookie that deletes the mirror.
#[must_use]
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

#[derive(Clone)]
pub struct PersistedSessionStore {
    storage: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieMirror>,
    secure_cookie: bool,
}

impl PersistedSessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, cookies: Arc<dyn CookieMirror>) -> Self {
        Self { storage, cookies, secure_cookie: false }
    }

    /// Store backed by fresh in-memory maps.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryCookieJar::new()))
    }

    /// Mark the cookie mirror `Secure` (HTTPS deployments).
    #[must_use]
    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Persist or clear the token, writing the cookie mirror in the same step.
    pub fn set_token(&self, token: Option<&str>) {
        match token.filter(|token| !token.is_empty()) {
            Some(token) => {
                self.storage.set(TOKEN_KEY, token);
                self.mirror_cookie(token);
            }
            None => {
                self.storage.remove(TOKEN_KEY);
                self.cookies.set(cleared_session_cookie(self.secure_cookie));
            }
        }
    }

    /// Rewrite the cookie for `token` without touching durable storage.
    ///
    /// Cookies can be evicted independently of storage, so startup re-syncs.
    pub fn mirror_cookie(&self, token: &str) {
        self.cookies.set(session_cookie(token, self.secure_cookie));
    }

    /// Whether the edge guard would currently see a session cookie.
    #[must_use]
    pub fn cookie_present(&self) -> bool {
        self.cookies.get(COOKIE_NAME).is_some_and(|value| !value.is_empty())
    }

    #[must_use]
    pub fn get_user(&self) -> Option<User> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupted stored user");
                self.storage.remove(USER_KEY);
                None
            }
        }
    }

    pub fn set_user(&self, user: Option<&User>) {
        let Some(user) = user else {
            self.storage.remove(USER_KEY);
            return;
        };
        match serde_json::to_string(user) {
            Ok(json) => self.storage.set(USER_KEY, &json),
            Err(e) => {
                tracing::warn!(error = %e, "user encode failed; clearing stored user");
                self.storage.remove(USER_KEY);
            }
        }
    }

    /// Drop token, cookie and user together.
    pub fn clear(&self) {
        self.set_token(None);
        self.set_user(None);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
