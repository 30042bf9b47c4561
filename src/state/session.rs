//! Session state machine for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionController` is the single source of truth for "who is signed in".
//! Views read it through [`SessionController::subscribe`]; pages that need a
//! user redirect to login once `is_loading()` is false and `user()` is `None`.
//!
//! DESIGN
//! ======
//! States run `Initializing -> {Authenticated, Unauthenticated}` and never go
//! back to `Initializing`. Every write to the stored user happens before the
//! matching state publish, so once an operation returns, `Authenticated`
//! holds exactly when the store holds a user.

use std::sync::Arc;

use tokio::sync::watch;

use crate::net::api::ApiGateway;
use crate::net::error::ApiError;
use crate::net::types::{AuthResponse, ProfileUpdate, User};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Stored session not yet read.
    #[default]
    Initializing,
    Authenticated(User),
    Unauthenticated,
}

impl SessionState {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }
}

pub struct SessionController {
    gateway: Arc<ApiGateway>,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    /// Controller in `Initializing`; call [`initialize`](Self::initialize) once.
    #[must_use]
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway, state: watch::Sender::new(SessionState::Initializing) }
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Watch state changes. The receiver starts at the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Adopt the persisted session, or clear whatever partial state is left.
    ///
    /// Only the first call does anything; later calls return the current state.
    pub fn initialize(&self) -> SessionState {
        if !self.is_loading() {
            tracing::debug!("session already initialized");
            return self.state();
        }

        let store = self.gateway.store();
        match (store.get_token(), store.get_user()) {
            (Some(token), Some(user)) => {
                store.mirror_cookie(&token);
                self.transition(SessionState::Authenticated(user));
            }
            _ => {
                self.gateway.set_token(None);
                store.set_user(None);
                self.transition(SessionState::Unauthenticated);
            }
        }
        self.state()
    }

    /// # Errors
    ///
    /// Propagates the gateway's [`ApiError`] unchanged; state is untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let response = self.gateway.login(email, password).await?;
        tracing::info!(user_id = %response.user.id, "logged in");
        Ok(self.adopt(response))
    }

    /// # Errors
    ///
    /// Propagates the gateway's [`ApiError`] unchanged; state is untouched.
    pub async fn login_with_google(&self, credential: &str) -> Result<User, ApiError> {
        let response = self.gateway.google_auth(credential).await?;
        tracing::info!(user_id = %response.user.id, "logged in with google");
        Ok(self.adopt(response))
    }

    /// # Errors
    ///
    /// Propagates the gateway's [`ApiError`] unchanged; state is untouched.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> Result<User, ApiError> {
        let response = self.gateway.register(email, password, username).await?;
        tracing::info!(user_id = %response.user.id, "registered");
        Ok(self.adopt(response))
    }

    /// Save profile edits and merge them into the current user.
    ///
    /// Returns the updated user, or `None` if nobody was signed in.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's [`ApiError`] unchanged; state is untouched.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Option<User>, ApiError> {
        self.gateway.update_profile(&update).await?;
        let Some(mut user) = self.user() else {
            return Ok(None);
        };
        user.username = update.username;
        user.email = update.email;
        self.gateway.store().set_user(Some(&user));
        self.transition(SessionState::Authenticated(user.clone()));
        Ok(Some(user))
    }

    /// Clear token, cookie and stored user. Navigation is the caller's job.
    pub fn logout(&self) {
        self.gateway.logout();
        self.gateway.store().set_user(None);
        self.transition(SessionState::Unauthenticated);
        tracing::info!("logged out");
    }

    /// Drop the user after the API rejected the token.
    ///
    /// Skipped when a token is present again, i.e. a newer login already
    /// replaced the rejected session.
    pub fn invalidate(&self) {
        if self.gateway.token().is_some() {
            tracing::debug!("ignoring stale invalidation; session was re-established");
            return;
        }
        self.gateway.store().clear();
        self.transition(SessionState::Unauthenticated);
    }

    fn adopt(&self, response: AuthResponse) -> User {
        self.gateway.store().set_user(Some(&response.user));
        self.transition(SessionState::Authenticated(response.user.clone()));
        response.user
    }

    fn transition(&self, next: SessionState) {
        let to = next.label();
        let previous = self.state.send_replace(next);
        tracing::debug!(from = previous.label(), to, "session state");
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
