//! Error types for imagery-export orchestration.

use thiserror::Error;

/// Result type alias using ExportError.
pub type ExportResult<T> = Result<T, ExportError>;

/// Primary error type for the orchestration layer.
///
/// Variants fall into three families: configuration failures (boot-time,
/// fatal), request validation failures (detected before any remote call)
/// and remote-service faults (surfaced once, never retried here).
#[derive(Debug, Error)]
pub enum ExportError {
    // === Configuration Errors ===
    #[error("Registry configuration error: {0}")]
    Config(String),

    #[error("Registry version mismatch: configmap is {found}, lock requires {expected}")]
    VersionMismatch { expected: String, found: String },

    // === Validation Errors ===
    #[error("Invalid sensor ID: {0}")]
    InvalidSensor(String),

    #[error("Invalid satellite ID: {0}")]
    InvalidSatellite(String),

    #[error("Invalid product '{product}' for sensor {sensor}")]
    InvalidRequest { sensor: String, product: String },

    #[error("Invalid verification mode: {0}")]
    InvalidMode(String),

    #[error("No band algebra for product '{product}' on satellite {satellite}")]
    UnsupportedProduct { satellite: String, product: String },

    #[error("Image provenance does not match {expected}")]
    ProvenanceMismatch { expected: String },

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    // === Remote Service Errors ===
    #[error("Remote service failure during {stage}: {message}")]
    RemoteService { stage: &'static str, message: String },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    // === Internal Invariant Errors ===
    #[error("Count invariant violated: {0}")]
    TaskMismatch(String),
}

impl ExportError {
    /// Wrap a remote-service fault with the stage that failed.
    pub fn remote(stage: &'static str, err: impl std::fmt::Display) -> Self {
        ExportError::RemoteService {
            stage,
            message: err.to_string(),
        }
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidSensor(_)
                | ExportError::InvalidSatellite(_)
                | ExportError::InvalidRequest { .. }
                | ExportError::InvalidMode(_)
                | ExportError::UnsupportedProduct { .. }
                | ExportError::ProvenanceMismatch { .. }
                | ExportError::InvalidTimestamp(_)
        )
    }

    /// True for faults surfaced by the remote compute service; retry
    /// policy for these belongs to the caller.
    pub fn is_remote_fault(&self) -> bool {
        matches!(
            self,
            ExportError::RemoteService { .. } | ExportError::EmptyResult(_)
        )
    }
}
