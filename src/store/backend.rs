//! Storage seams behind [`PersistedSessionStore`](super::PersistedSessionStore).
//!
//! `KeyValueStore` is the durable store (browser local storage in the web
//! client, a JSON file for native hosts). `CookieMirror` is the cookie jar the
//! edge guard reads. Both are synchronous and infallible from the caller's
//! side; backends log their own I/O failures.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use axum_extra::extract::cookie::Cookie;
use time::{Duration, OffsetDateTime};

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

pub trait CookieMirror: Send + Sync {
    /// Current value of a live (unexpired) cookie.
    fn get(&self, name: &str) -> Option<String>;
    /// Store `cookie`; an already-expired cookie deletes the entry.
    fn set(&self, cookie: Cookie<'static>);
}

/// True when writing `cookie` should delete it rather than store it.
#[must_use]
pub fn is_expired(cookie: &Cookie<'_>) -> bool {
    if cookie.max_age().is_some_and(|age| age <= Duration::ZERO) {
        return true;
    }
    cookie
        .expires_datetime()
        .is_some_and(|at| at <= OffsetDateTime::now_utc())
}

// =============================================================================
// IN-MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// A stored cookie with the instant it lapses; `None` for session cookies.
#[derive(Debug, Clone)]
struct HeldCookie {
    cookie: Cookie<'static>,
    deadline: Option<OffsetDateTime>,
}

impl HeldCookie {
    fn new(cookie: Cookie<'static>) -> Self {
        let deadline = match (cookie.max_age(), cookie.expires_datetime()) {
            (Some(age), _) => Some(OffsetDateTime::now_utc() + age),
            (None, Some(at)) => Some(at),
            (None, None) => None,
        };
        Self { cookie, deadline }
    }

    fn is_live(&self) -> bool {
        self.deadline.is_none_or(|at| at > OffsetDateTime::now_utc())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, HeldCookie>>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full live cookie as last written, attributes included. A lapsed
    /// entry is dropped on read.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<Cookie<'static>> {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        match cookies.get(name) {
            Some(held) if held.is_live() => Some(held.cookie.clone()),
            Some(_) => {
                cookies.remove(name);
                None
            }
            None => None,
        }
    }
}

impl CookieMirror for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|cookie| cookie.value().to_owned())
    }

    fn set(&self, cookie: Cookie<'static>) {
        let mut cookies = self.cookies.lock().unwrap_or_else(PoisonError::into_inner);
        if is_expired(&cookie) {
            cookies.remove(cookie.name());
        } else {
            cookies.insert(cookie.name().to_owned(), HeldCookie::new(cookie));
        }
    }
}
