//! Field descriptors: the region of interest plus the stable identifier
//! used to compose export destination paths.

use serde::{Deserialize, Serialize};

use crate::geometry::Geometry;

/// A client field/farm: a stable identifier and its region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable field identifier, the first segment of every export path.
    pub id: String,
    /// Region of interest for spatial filtering and export clipping.
    pub geometry: Geometry,
}

impl Field {
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: id.into(),
            geometry,
        }
    }
}
