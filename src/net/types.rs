//! Wire DTOs for the finance API's auth surface.
//!
//! DESIGN
//! ======
//! Only the auth payloads are typed here. Transactions, analytics and
//! insights stay `serde_json::Value` because this crate never inspects them.

use serde::{Deserialize, Serialize};

/// An authenticated user as returned by the auth endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier assigned by the API.
    pub id: String,
    /// Login email address.
    pub email: String,
    /// Display name. Some endpoints send it as `name`; one of the two is required.
    #[serde(alias = "name")]
    pub username: String,
}

/// Successful response from `/auth/login`, `/auth/register` and `/auth/google`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    /// Bearer token to attach to every later request.
    pub access_token: String,
    /// Usually `"bearer"`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Profile of the user that just authenticated.
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub username: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleAuthRequest<'a> {
    pub token: &'a str,
}

/// Body of `PUT /auth/profile`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message, if the `detail` field carries one.
    ///
    /// Validation errors arrive as a list of `{ "msg": ... }` objects; the
    /// first message is used.
    pub(crate) fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                .map(ToOwned::to_owned),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
