//! Error types for the delivery tracker.

use crate::api::ClientError;
use crate::framework::FrameworkError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackerError {
    /// The backend call failed or refused the request.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An error occurred while communicating with the snapshot actor.
    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),
}

impl TrackerError {
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            TrackerError::Client(e) => Some(e),
            TrackerError::Framework(_) => None,
        }
    }

    pub fn is_rejected_transition(&self) -> bool {
        matches!(self, TrackerError::Client(ClientError::RejectedTransition(_)))
    }
}
