use thiserror::Error;

use crate::queue::JobStoreError;

/// Errors that cross the dispatcher boundary.
///
/// Resolution and delivery failures never appear here; they are folded
/// into the returned `DispatchResult`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A required request field was missing or blank
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The queued job could not be written
    #[error("Failed to persist queued job: {0}")]
    Persistence(#[from] JobStoreError),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::InvalidRequest(_) => "INVALID_REQUEST",
            DispatchError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}
