//! Opaque references into the remote evaluation graph.

use serde::{Deserialize, Serialize};

/// Reference to a single raster image node on the remote service.
///
/// Produced only by [`ComputeService`](crate::ComputeService)
/// implementations; clients never mint these themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHandle(u64);

/// Reference to an image collection node on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionHandle(u64);

impl ImageHandle {
    /// Mint a handle. Reserved for service backends.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl CollectionHandle {
    /// Mint a handle. Reserved for service backends.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}
