//! Route authorization predicate.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs at the edge, before any page code, with nothing but the request path
//! and whether the session cookie is present. The cookie only proves a token
//! exists; the API checks validity on the first real request.
//!
//! DESIGN
//! ======
//! Pure and I/O-free. Prefix matching is raw `starts_with`, so `/homework`
//! counts as protected under `/home`.

pub const LOGIN_PATH: &str = "/auth/login";
pub const LANDING_PATH: &str = "/home";
pub const REDIRECT_PARAM: &str = "redirect";

/// Authenticated-only path prefixes.
pub const PROTECTED_PREFIXES: &[&str] = &["/home", "/dashboard", "/transactions", "/insights", "/upload", "/settings"];

/// Login and register views.
pub const PUBLIC_AUTH_PREFIXES: &[&str] = &["/auth/login", "/auth/register"];

const AUTH_VIEW_PREFIX: &str = "/auth";
const ASSET_PREFIXES: &[&str] = &["/pkg/", "/static/"];
const ASSET_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".svg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Protected,
    PublicAuth,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Redirect to login; `location` carries the original path.
    RedirectToLogin { location: String },
    RedirectHome,
}

impl GuardDecision {
    /// Redirect target, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::RedirectToLogin { location } => Some(location),
            Self::RedirectHome => Some(LANDING_PATH),
        }
    }
}

#[must_use]
pub fn classify(path: &str) -> PathClass {
    if PROTECTED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        PathClass::Protected
    } else if PUBLIC_AUTH_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        PathClass::PublicAuth
    } else {
        PathClass::Unclassified
    }
}

#[must_use]
pub fn evaluate(path: &str, cookie_present: bool) -> GuardDecision {
    match (classify(path), cookie_present) {
        (PathClass::Protected, false) => GuardDecision::RedirectToLogin { location: login_location(path) },
        (PathClass::PublicAuth, true) => GuardDecision::RedirectHome,
        _ => GuardDecision::Allow,
    }
}

/// `/auth/login?redirect=<path>` with the path percent-encoded.
#[must_use]
pub fn login_location(path: &str) -> String {
    format!("{LOGIN_PATH}?{REDIRECT_PARAM}={}", urlencoding::encode(path))
}

/// Requests the guard never sees: API calls, bundles, static files, images.
#[must_use]
pub fn is_static_asset(path: &str) -> bool {
    if path == "/api" || path.starts_with("/api/") || path == "/favicon.ico" {
        return true;
    }
    if ASSET_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return true;
    }
    let lower = path.to_ascii_lowercase();
    ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Whether `path` is one of the authentication views.
#[must_use]
pub fn is_auth_view(path: &str) -> bool {
    path == AUTH_VIEW_PREFIX || path.starts_with("/auth/")
}

/// Where to go after a successful login, given the login page's query string.
///
/// Only same-origin absolute paths are honored; anything else lands on
/// [`LANDING_PATH`].
#[must_use]
pub fn login_redirect_target(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == REDIRECT_PARAM)
        .and_then(|(_, value)| decode_param(value))
        .filter(|target| is_safe_redirect(target))
        .unwrap_or_else(|| LANDING_PATH.to_owned())
}

fn decode_param(value: &str) -> Option<String> {
    match urlencoding::decode(&value.replace('+', " ")) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::debug!(error = %e, "undecodable redirect parameter");
            None
        }
    }
}

fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
