//! Client session and route-authorization subsystem for the FinSight
//! finance app.
//!
//! SYSTEM CONTEXT
//! ==============
//! - [`store`] keeps the bearer token and cached user durable, and mirrors
//!   token presence into a cookie for the edge.
//! - [`net`] is the single API gateway with its error taxonomy.
//! - [`state`] holds the session state machine that views observe.
//! - [`shell`] turns gateway invalidation events into navigation.
//! - [`guard`] and [`edge`] decide allow/redirect before any page renders.

pub mod config;
pub mod edge;
pub mod events;
pub mod guard;
pub mod net;
pub mod shell;
pub mod state;
pub mod store;
pub mod validation;

pub use events::SessionEvent;
pub use net::{ApiError, ApiGateway, User};
pub use shell::{Navigator, SessionShell};
pub use state::{SessionController, SessionState};
pub use store::PersistedSessionStore;
