//! Error taxonomy shared by every backend-facing operation.

use thiserror::Error;

/// Every failure of a backend call is converted into one of these kinds at the call site.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClientError {
    /// Transport failure, timeout, server error or undecodable response.
    #[error("Network error: {0}")]
    Network(String),

    /// The referenced entity no longer exists server-side.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A precondition the client can check itself (empty cart, missing address).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The backend refused a requested status change.
    #[error("Transition rejected: {0}")]
    RejectedTransition(String),

    /// The backend refused a request for another reason (e.g. an order it won't accept).
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// No session token, or the backend no longer accepts it.
    #[error("Not authenticated")]
    Unauthorized,
}

impl ClientError {
    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::NotFound(_))
    }
}
