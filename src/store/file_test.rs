use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum_extra::extract::cookie::SameSite;
use time::Duration;

use crate::store::{COOKIE_NAME, cleared_session_cookie, session_cookie};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn scratch_dir() -> PathBuf {
    let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("finsight-file-test-{}-{n}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

// =============================================================
// FileStore
// =============================================================

#[test]
fn missing_file_reads_empty() {
    let dir = scratch_dir();
    let store = FileStore::in_dir(&dir);
    assert!(store.get("auth_token").is_none());
}

#[test]
fn set_creates_dir_and_round_trips() {
    let dir = scratch_dir();
    let store = FileStore::in_dir(&dir);
    store.set("auth_token", "abc123");
    assert_eq!(store.get("auth_token").as_deref(), Some("abc123"));
    assert!(dir.join(STORAGE_FILE).exists());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn values_survive_new_instance() {
    let dir = scratch_dir();
    FileStore::in_dir(&dir).set("user_data", r#"{"id":"u1"}"#);
    let reopened = FileStore::in_dir(&dir);
    assert_eq!(reopened.get("user_data").as_deref(), Some(r#"{"id":"u1"}"#));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn remove_deletes_only_that_key() {
    let dir = scratch_dir();
    let store = FileStore::in_dir(&dir);
    store.set("auth_token", "abc123");
    store.set("user_data", "{}");
    store.remove("auth_token");
    assert!(store.get("auth_token").is_none());
    assert_eq!(store.get("user_data").as_deref(), Some("{}"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn garbage_file_reads_empty_and_is_overwritten() {
    let dir = scratch_dir();
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(STORAGE_FILE), "{{{ not json").unwrap();
    let store = FileStore::in_dir(&dir);
    assert!(store.get("auth_token").is_none());
    store.set("auth_token", "t");
    assert_eq!(store.get("auth_token").as_deref(), Some("t"));
    fs::remove_dir_all(&dir).unwrap();
}

// =============================================================
// FileCookieJar
// =============================================================

#[test]
fn cookie_round_trips_with_attributes() {
    let dir = scratch_dir();
    let jar = FileCookieJar::in_dir(&dir);
    jar.set(session_cookie("abc123", false));
    assert_eq!(jar.get(COOKIE_NAME).as_deref(), Some("abc123"));

    let raw = jar.raw(COOKIE_NAME).unwrap();
    let parsed = Cookie::parse(raw).unwrap();
    assert_eq!(parsed.path(), Some("/"));
    assert_eq!(parsed.same_site(), Some(SameSite::Strict));
    assert_eq!(parsed.max_age(), Some(Duration::days(7)));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn expired_cookie_deletes_entry() {
    let dir = scratch_dir();
    let jar = FileCookieJar::in_dir(&dir);
    jar.set(session_cookie("abc123", false));
    jar.set(cleared_session_cookie(false));
    assert!(jar.get(COOKIE_NAME).is_none());
    assert!(jar.raw(COOKIE_NAME).is_none());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn stale_cookie_on_disk_reads_absent() {
    let dir = scratch_dir();
    fs::create_dir_all(&dir).unwrap();
    let stale = serde_json::json!({
        "auth_token": { "value": "old", "expires_at": 1, "raw": "auth_token=old" }
    });
    fs::write(dir.join(COOKIE_FILE), stale.to_string()).unwrap();
    let jar = FileCookieJar::in_dir(&dir);
    assert!(jar.get(COOKIE_NAME).is_none());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn cookie_and_storage_files_are_separate() {
    let dir = scratch_dir();
    let store = FileStore::in_dir(&dir);
    let jar = FileCookieJar::in_dir(&dir);
    store.set("auth_token", "abc123");
    jar.set(session_cookie("abc123", false));
    store.remove("auth_token");
    assert_eq!(jar.get(COOKIE_NAME).as_deref(), Some("abc123"));
    fs::remove_dir_all(&dir).unwrap();
}
