//! Application shell reaction to session invalidation.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway publishes [`SessionEvent::Invalidated`] after a 401 and stops
//! there. The shell is the one place that turns that event into a UI effect:
//! it drops the controller's user and sends the view to the login page.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::events::SessionEvent;
use crate::guard;
use crate::state::SessionController;

/// Host-specific view navigation.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

pub struct SessionShell {
    controller: Arc<SessionController>,
    navigator: Arc<dyn Navigator>,
}

impl SessionShell {
    #[must_use]
    pub fn new(controller: Arc<SessionController>, navigator: Arc<dyn Navigator>) -> Self {
        Self { controller, navigator }
    }

    /// React to one event. Returns whether it navigated.
    pub fn handle_event(&self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::Invalidated => {
                self.controller.invalidate();
                let current = self.navigator.current_path();
                if guard::is_auth_view(&current) {
                    tracing::debug!(path = %current, "session invalidated on auth view; staying");
                    return false;
                }
                tracing::info!(from = %current, "session invalidated; redirecting to login");
                self.navigator.navigate(guard::LOGIN_PATH);
                true
            }
        }
    }

    /// Consume gateway events until the channel closes.
    ///
    /// A lagged receiver still handles one invalidation, since every
    /// dropped event was one.
    pub fn spawn(self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        self.handle_event(event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session event receiver lagged");
                        self.handle_event(SessionEvent::Invalidated);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
