//! Edge router serving the pre-rendered site behind the route guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! The guard middleware runs before any page is served. It reads only the
//! `auth_token` cookie mirror, since the durable session store lives in the
//! client and is out of reach here. Static assets and API paths skip it.

use std::path::Path;

use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::cookie::CookieJar;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::guard::{self, GuardDecision};
use crate::store::COOKIE_NAME;

/// Guarded static site at `site_dir`, plus `/healthz`.
#[must_use]
pub fn app(site_dir: &Path) -> Router {
    let site = ServeDir::new(site_dir).append_index_html_on_directories(true);
    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(site)
        .layer(middleware::from_fn(route_guard))
        .layer(TraceLayer::new_for_http())
}

/// Apply [`guard::evaluate`] to the request path.
pub async fn route_guard(jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if guard::is_static_asset(path) {
        return next.run(request).await;
    }

    let cookie_present = jar.get(COOKIE_NAME).is_some_and(|cookie| !cookie.value().is_empty());
    let decision = guard::evaluate(path, cookie_present);
    tracing::debug!(path, cookie_present, ?decision, "route guard");

    match decision {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::RedirectToLogin { location } => Redirect::temporary(&location).into_response(),
        GuardDecision::RedirectHome => Redirect::temporary(guard::LANDING_PATH).into_response(),
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "edge_test.rs"]
mod tests;
