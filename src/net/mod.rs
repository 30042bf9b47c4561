//! Networking for the finance API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` is the single outbound gateway, `transport` is the HTTP seam it
//! drives, `error` is the failure taxonomy, and `types` defines the auth
//! wire schema.

pub mod api;
pub mod error;
pub mod transport;
pub mod types;

pub use api::ApiGateway;
pub use error::{ApiError, TransportError};
pub use types::{AuthResponse, ProfileUpdate, User};

#[cfg(test)]
#[path = "mock_test.rs"]
pub(crate) mod mock;
