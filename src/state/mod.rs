//! Client-side session state.
//!
//! DESIGN
//! ======
//! One controller owns the in-memory state machine; views subscribe to it
//! instead of reading storage directly.

pub mod session;

pub use session::{SessionController, SessionState};
