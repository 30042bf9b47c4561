//! Failure taxonomy for outbound API calls.
//!
//! DESIGN
//! ======
//! Callers display `message()` uniformly. The variants stay distinct so logs
//! and the session shell can tell a dead network from a rejected token.

/// Fallback when a JSON request fails without a readable `detail`.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Fallback when an upload fails without a readable `detail`.
pub const UPLOAD_ERROR_MESSAGE: &str = "Upload failed";

/// Raised by an [`HttpTransport`](super::transport::HttpTransport) when no
/// response was obtained at all (offline, DNS, TLS, timeout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self(error.to_string())
    }
}

/// Errors produced by [`ApiGateway`](super::api::ApiGateway) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response was obtained.
    #[error("network request failed: {0}")]
    Transport(#[from] TransportError),

    /// The API answered with a non-2xx status other than 401.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The API answered 401. The session has already been cleared.
    #[error("{message}")]
    Unauthorized { message: String },

    /// A 2xx body could not be decoded into the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// User-facing message, suitable for inline form errors.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Server { message, .. } | Self::Unauthorized { message } => message.clone(),
            Self::Transport(_) | Self::Decode(_) => self.to_string(),
        }
    }

    /// HTTP status when the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
