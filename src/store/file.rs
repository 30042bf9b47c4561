//! JSON-file backends for native hosts.
//!
//! Each store owns one file holding a flat JSON object. Writes rewrite the
//! whole file; the mutex serializes writers inside one process. Separate
//! processes sharing a directory get last-writer-wins, same as browser tabs.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use axum_extra::extract::cookie::Cookie;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;

use super::backend::{CookieMirror, KeyValueStore, is_expired};

pub const STORAGE_FILE: &str = "storage.json";
pub const COOKIE_FILE: &str = "cookies.json";

fn read_map<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "session file read failed");
            return BTreeMap::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "session file is not valid JSON; ignoring");
            BTreeMap::new()
        }
    }
}

fn write_map<V: Serialize>(path: &Path, map: &BTreeMap<String, V>) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "session dir create failed");
            return;
        }
    }
    let json = match serde_json::to_string_pretty(map) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "session file encode failed");
            return;
        }
    };
    if let Err(e) = fs::write(path, json) {
        tracing::warn!(path = %path.display(), error = %e, "session file write failed");
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Store at `<dir>/storage.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STORAGE_FILE))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        read_map::<String>(&self.path).remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = read_map::<String>(&self.path);
        map.insert(key.to_owned(), value.to_owned());
        write_map(&self.path, &map);
    }

    fn remove(&self, key: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = read_map::<String>(&self.path);
        if map.remove(key).is_some() {
            write_map(&self.path, &map);
        }
    }
}

// =============================================================================
// FILE COOKIE JAR
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    /// Absolute expiry as Unix seconds; `None` for session cookies.
    expires_at: Option<i64>,
    /// `Set-Cookie` rendering as last written.
    raw: String,
}

pub struct FileCookieJar {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCookieJar {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Jar at `<dir>/cookies.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(COOKIE_FILE))
    }

    /// `Set-Cookie` rendering of a live cookie.
    #[must_use]
    pub fn raw(&self, name: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        read_map::<StoredCookie>(&self.path)
            .remove(name)
            .filter(|stored| stored.expires_at.is_none_or(|at| at > now))
            .map(|stored| stored.raw)
    }
}

impl CookieMirror for FileCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let now = OffsetDateTime::now_utc().unix_timestamp();
        read_map::<StoredCookie>(&self.path)
            .remove(name)
            .filter(|stored| stored.expires_at.is_none_or(|at| at > now))
            .map(|stored| stored.value)
    }

    fn set(&self, cookie: Cookie<'static>) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = read_map::<StoredCookie>(&self.path);
        if is_expired(&cookie) {
            if map.remove(cookie.name()).is_some() {
                write_map(&self.path, &map);
            }
            return;
        }

        let now = OffsetDateTime::now_utc();
        let expires_at = match (cookie.max_age(), cookie.expires_datetime()) {
            (Some(age), _) => Some((now + age).unix_timestamp()),
            (None, Some(at)) => Some(at.unix_timestamp()),
            (None, None) => None,
        };
        map.insert(
            cookie.name().to_owned(),
            StoredCookie { value: cookie.value().to_owned(), expires_at, raw: cookie.to_string() },
        );
        write_map(&self.path, &map);
    }
}

#[cfg(test)]
#[path = "file_test.rs"]
mod tests;
