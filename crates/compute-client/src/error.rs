//! Error type for remote compute service calls.

use thiserror::Error;

/// Result type alias for compute service operations.
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Faults surfaced by the remote compute service.
///
/// These form the remote-fault family of the error taxonomy: callers in
/// the orchestration crates wrap them into
/// `ExportError::RemoteService` together with the stage that failed.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Unknown {kind} handle: {id}")]
    UnknownHandle { kind: &'static str, id: u64 },

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Missing band: {0}")]
    MissingBand(String),

    #[error("Missing property: {0}")]
    MissingProperty(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

impl ComputeError {
    pub fn unknown_image(id: u64) -> Self {
        ComputeError::UnknownHandle { kind: "image", id }
    }

    pub fn unknown_collection(id: u64) -> Self {
        ComputeError::UnknownHandle {
            kind: "collection",
            id,
        }
    }
}
