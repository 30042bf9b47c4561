//! REST gateway for the finance API.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every outbound call goes through one [`ApiGateway`], constructed once at
//! startup and shared by reference. It owns the in-memory copy of the bearer
//! token, attaches it to each request, and turns responses into `ApiError`s.
//!
//! ERROR HANDLING
//! ==============
//! A 401 from any endpoint clears the token (cache, durable store, cookie)
//! before the error is returned, then publishes `SessionEvent::Invalidated`.
//! The gateway never navigates; the session shell reacts to the event.

use std::sync::{Arc, PoisonError, RwLock};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

use super::error::{ApiError, DEFAULT_ERROR_MESSAGE, TransportError, UPLOAD_ERROR_MESSAGE};
use super::transport::{FilePart, HttpRequest, HttpResponse, HttpTransport, RequestBody, ReqwestTransport};
use super::types::{
    AuthResponse, ChangePasswordRequest, ErrorBody, GoogleAuthRequest, LoginRequest, ProfileUpdate,
    RegisterRequest,
};
use crate::config::ClientConfig;
use crate::events::{self, SessionEvent};
use crate::store::PersistedSessionStore;

const CSV_CONTENT_TYPE: &str = "text/csv";

pub struct ApiGateway {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    store: PersistedSessionStore,
    token: RwLock<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiGateway {
    /// Build a gateway, seeding the token cache from `store`.
    #[must_use]
    pub fn new(base_url: &str, transport: Arc<dyn HttpTransport>, store: PersistedSessionStore) -> Self {
        let token = store.get_token();
        Self {
            base_url: crate::config::normalize_base_url(base_url),
            transport,
            store,
            token: RwLock::new(token),
            events: events::channel(),
        }
    }

    /// Build a gateway backed by `reqwest` using `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &ClientConfig, store: PersistedSessionStore) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.timeouts)?;
        Ok(Self::new(&config.api_url, Arc::new(transport), store))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn store(&self) -> &PersistedSessionStore {
        &self.store
    }

    /// Cached bearer token.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the cached token and persist it (with its cookie mirror).
    pub fn set_token(&self, token: Option<&str>) {
        let token = token.filter(|token| !token.is_empty());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token.map(ToOwned::to_owned);
        self.store.set_token(token);
    }

    /// Receive [`SessionEvent`]s published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // CORE REQUEST PATH
    // =========================================================================

    /// Issue a JSON request and return the parsed body.
    ///
    /// A 204 (or any empty 2xx body) yields an empty JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or an
    /// unparseable success body.
    pub async fn request_json(&self, method: Method, endpoint: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut headers = vec![("Content-Type".to_owned(), "application/json".to_owned())];
        headers.extend(self.authorization());
        let request = HttpRequest {
            method,
            url: self.url(endpoint),
            headers,
            body: body.map_or(RequestBody::Empty, RequestBody::Json),
        };

        let response = self.dispatch(request, DEFAULT_ERROR_MESSAGE).await?;
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// [`request_json`](Self::request_json) decoded into `T`.
    ///
    /// # Errors
    ///
    /// As `request_json`, plus [`ApiError::Decode`] if the body does not fit `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.request_json(method, endpoint, body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn authorization(&self) -> Option<(String, String)> {
        self.token()
            .map(|token| ("Authorization".to_owned(), format!("Bearer {token}")))
    }

    async fn dispatch(&self, request: HttpRequest, fallback: &str) -> Result<HttpResponse, ApiError> {
        let url = request.url.clone();
        let has_token = request.header("Authorization").is_some();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(%url, error = %e, "api transport failure");
                return Err(ApiError::Transport(e));
            }
        };
        if response.is_success() {
            return Ok(response);
        }

        let message = error_message(&response.body).unwrap_or_else(|| fallback.to_owned());
        tracing::warn!(%url, status = response.status, %message, has_token, "api error response");

        if response.status == 401 {
            self.invalidate();
            return Err(ApiError::Unauthorized { message });
        }
        Err(ApiError::Server { status: response.status, message })
    }

    fn invalidate(&self) {
        tracing::info!("api rejected bearer token; clearing session");
        self.set_token(None);
        if self.events.send(SessionEvent::Invalidated).is_err() {
            tracing::debug!("no session listeners for invalidation");
        }
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    /// `POST /auth/login`. Caches the returned token before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = to_json(&LoginRequest { email, password })?;
        self.authenticate("/auth/login", body).await
    }

    /// `POST /auth/register`. Caches the returned token before returning.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<AuthResponse, ApiError> {
        let body = to_json(&RegisterRequest { email, password, username })?;
        self.authenticate("/auth/register", body).await
    }

    /// `POST /auth/google` with a federated ID token credential.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn google_auth(&self, credential: &str) -> Result<AuthResponse, ApiError> {
        let body = to_json(&GoogleAuthRequest { token: credential })?;
        self.authenticate("/auth/google", body).await
    }

    async fn authenticate(&self, endpoint: &str, body: Value) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.request(Method::POST, endpoint, Some(body)).await?;
        self.set_token(Some(&response.access_token));
        Ok(response)
    }

    /// Forget the token locally. There is no server-side logout endpoint.
    pub fn logout(&self) {
        self.set_token(None);
    }

    /// `PUT /auth/profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Value, ApiError> {
        self.request_json(Method::PUT, "/auth/profile", Some(to_json(update)?)).await
    }

    /// `POST /auth/change-password`. Callers validate the new password first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<Value, ApiError> {
        let body = to_json(&ChangePasswordRequest { current_password, new_password })?;
        self.request_json(Method::POST, "/auth/change-password", Some(body)).await
    }

    // =========================================================================
    // TRANSACTIONS / ANALYTICS / INSIGHTS
    // =========================================================================

    /// `GET /transactions` with optional filter parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn list_transactions(&self, params: &[(&str, &str)]) -> Result<Value, ApiError> {
        let endpoint = with_query("/transactions", params);
        self.request_json(Method::GET, &endpoint, None).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn create_transaction(&self, transaction: Value) -> Result<Value, ApiError> {
        self.request_json(Method::POST, "/transactions", Some(transaction)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn update_transaction(&self, id: &str, updates: Value) -> Result<Value, ApiError> {
        let endpoint = format!("/transactions/{}", urlencoding::encode(id));
        self.request_json(Method::PUT, &endpoint, Some(updates)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn delete_transaction(&self, id: &str) -> Result<Value, ApiError> {
        let endpoint = format!("/transactions/{}", urlencoding::encode(id));
        self.request_json(Method::DELETE, &endpoint, None).await
    }

    /// `GET /analytics/summary`, optionally bounded by ISO dates.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn summary(&self, start_date: Option<&str>, end_date: Option<&str>) -> Result<Value, ApiError> {
        let mut params = Vec::new();
        if let Some(start) = start_date {
            params.push(("start_date", start));
        }
        if let Some(end) = end_date {
            params.push(("end_date", end));
        }
        let endpoint = with_query("/analytics/summary", &params);
        self.request_json(Method::GET, &endpoint, None).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn anomalies(&self) -> Result<Value, ApiError> {
        self.request_json(Method::GET, "/analytics/anomalies", None).await
    }

    /// `GET /analytics/trends?months=N`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn trends(&self, months: u32) -> Result<Value, ApiError> {
        self.request_json(Method::GET, &format!("/analytics/trends?months={months}"), None)
            .await
    }

    /// `POST /insights/generate` for a period such as `month`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn generate_insights(&self, period: &str) -> Result<Value, ApiError> {
        let body = serde_json::json!({ "period": period });
        self.request_json(Method::POST, "/insights/generate", Some(body)).await
    }

    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn insights(&self, limit: u32) -> Result<Value, ApiError> {
        self.request_json(Method::GET, &format!("/insights?limit={limit}"), None)
            .await
    }

    // =========================================================================
    // UPLOAD
    // =========================================================================

    /// `POST /upload/csv` as multipart field `file`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the body is not JSON.
    pub async fn upload_csv(&self, file_name: &str, bytes: Vec<u8>) -> Result<Value, ApiError> {
        let request = HttpRequest {
            method: Method::POST,
            url: self.url("/upload/csv"),
            headers: self.authorization().into_iter().collect(),
            body: RequestBody::Multipart(FilePart {
                field: "file".to_owned(),
                file_name: file_name.to_owned(),
                content_type: CSV_CONTENT_TYPE.to_owned(),
                bytes,
            }),
        };
        let response = self.dispatch(request, UPLOAD_ERROR_MESSAGE).await?;
        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /upload/template` as plain CSV text.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn download_template(&self) -> Result<String, ApiError> {
        let request = HttpRequest {
            method: Method::GET,
            url: self.url("/upload/template"),
            headers: self.authorization().into_iter().collect(),
            body: RequestBody::Empty,
        };
        let response = self.dispatch(request, DEFAULT_ERROR_MESSAGE).await?;
        Ok(response.body)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message(),
        Err(_) => None,
    }
}

fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_owned();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{query}")
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
