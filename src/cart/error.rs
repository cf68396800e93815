//! Error types for the cart actor.

use crate::api::ClientError;
use crate::framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CartError {
    /// Checkout preconditions or a backend refusal.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An error occurred while communicating with the cart actor.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),

    /// The actor answered an action with a result of the wrong shape.
    #[error("Unexpected cart reply: {0}")]
    UnexpectedReply(String),
}

impl CartError {
    pub fn validation(message: impl Into<String>) -> Self {
        CartError::Client(ClientError::ValidationError(message.into()))
    }

    /// The underlying client error, if this failure came from validation or the backend.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            CartError::Client(e) => Some(e),
            _ => None,
        }
    }
}
