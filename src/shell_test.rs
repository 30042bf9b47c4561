use super::*;

use std::sync::Mutex;

use crate::net::ApiGateway;
use crate::net::mock::{MockTransport, auth_body, json as ok};
use crate::state::SessionState;
use crate::store::{COOKIE_NAME, CookieMirror, MemoryCookieJar, MemoryStore, PersistedSessionStore};

struct MemoryNavigator {
    path: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    fn at(path: &str) -> Arc<Self> {
        Arc::new(Self { path: Mutex::new(path.to_owned()), visits: Mutex::new(Vec::new()) })
    }

    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn navigate(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_owned();
        self.visits.lock().unwrap().push(path.to_owned());
    }
}

struct Harness {
    controller: Arc<SessionController>,
    transport: Arc<MockTransport>,
    jar: Arc<MemoryCookieJar>,
}

async fn signed_in() -> Harness {
    let jar = Arc::new(MemoryCookieJar::new());
    let transport = MockTransport::new(vec![ok(200, auth_body("abc123", "u1", "a@b.com", "alice"))]);
    let store = PersistedSessionStore::new(Arc::new(MemoryStore::new()), jar.clone());
    let gateway = Arc::new(ApiGateway::new("http://api.test", transport.clone(), store));
    let controller = Arc::new(SessionController::new(gateway));
    controller.initialize();
    controller.login("a@b.com", "pw").await.unwrap();
    Harness { controller, transport, jar }
}

// =========================================================================
// handle_event
// =========================================================================

#[tokio::test]
async fn invalidation_navigates_to_login() {
    let h = signed_in().await;
    let navigator = MemoryNavigator::at("/dashboard");
    let shell = SessionShell::new(h.controller.clone(), navigator.clone());

    h.controller.gateway().set_token(None);
    assert!(shell.handle_event(SessionEvent::Invalidated));

    assert_eq!(navigator.visits(), vec!["/auth/login".to_owned()]);
    assert_eq!(h.controller.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn invalidation_on_auth_view_stays_put() {
    let h = signed_in().await;
    let navigator = MemoryNavigator::at("/auth/register");
    let shell = SessionShell::new(h.controller.clone(), navigator.clone());

    h.controller.gateway().set_token(None);
    assert!(!shell.handle_event(SessionEvent::Invalidated));

    assert!(navigator.visits().is_empty());
    assert_eq!(h.controller.state(), SessionState::Unauthenticated);
}

// =========================================================================
// spawn
// =========================================================================

#[tokio::test]
async fn unauthorized_response_redirects_through_spawned_shell() {
    let h = signed_in().await;
    let navigator = MemoryNavigator::at("/transactions");
    let mut states = h.controller.subscribe();
    let handle = SessionShell::new(h.controller.clone(), navigator.clone()).spawn(h.controller.gateway().subscribe());

    h.transport.push(ok(401, serde_json::json!({ "detail": "Not authenticated" })));
    let err = h.controller.gateway().list_transactions(&[]).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(h.jar.get(COOKIE_NAME), None);

    states.wait_for(|state| *state == SessionState::Unauthenticated).await.unwrap();
    assert_eq!(navigator.visits(), vec!["/auth/login".to_owned()]);

    handle.abort();
}
