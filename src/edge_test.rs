use super::*;

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::Body;
use axum::http::{Request, header};
use tower::ServiceExt;

static SITE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Minimal pre-rendered site with a home page and a login page.
fn site() -> PathBuf {
    let n = SITE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("finsight-edge-{}-{n}", std::process::id()));
    std::fs::create_dir_all(dir.join("home")).unwrap();
    std::fs::create_dir_all(dir.join("auth/login")).unwrap();
    std::fs::write(dir.join("home/index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.join("auth/login/index.html"), "<h1>login</h1>").unwrap();
    std::fs::write(dir.join("index.html"), "<h1>landing</h1>").unwrap();
    dir
}

async fn get_path(path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app(&site())
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

// =========================================================================
// guard decisions
// =========================================================================

#[tokio::test]
async fn protected_without_cookie_redirects_to_login() {
    let response = get_path("/home", None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login?redirect=%2Fhome");
}

#[tokio::test]
async fn protected_with_cookie_serves_page() {
    let response = get_path("/home/", Some("auth_token=abc123")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_cookie_counts_as_absent() {
    let response = get_path("/dashboard", Some("auth_token=")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/auth/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn login_with_cookie_redirects_home() {
    let response = get_path("/auth/login", Some("other=1; auth_token=abc123")).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/home");
}

#[tokio::test]
async fn login_without_cookie_serves_page() {
    let response = get_path("/auth/login/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unclassified_path_passes_through() {
    let response = get_path("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =========================================================================
// exclusions
// =========================================================================

#[tokio::test]
async fn assets_skip_the_guard() {
    // Would redirect if guarded; the asset simply does not exist.
    let response = get_path("/home/logo.png", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn healthz_is_ok() {
    let response = get_path("/healthz", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
