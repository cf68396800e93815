use crate::api::ClientError;
use crate::framework::FrameworkError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DashboardError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Actor communication error: {0}")]
    Framework(#[from] FrameworkError),
}
