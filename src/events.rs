//! Session notifications published by the data layer.

use tokio::sync::broadcast;

/// Capacity of the gateway's event channel. Events are rare (one per 401),
/// so a lagging receiver only ever misses duplicates.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The API rejected the bearer token; it has already been cleared from
    /// the gateway cache, durable storage and the cookie mirror.
    Invalidated,
}

pub(crate) fn channel() -> broadcast::Sender<SessionEvent> {
    broadcast::channel(EVENT_CHANNEL_CAPACITY).0
}
