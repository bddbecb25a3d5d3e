//! Common types shared across the imagery-export workspace.

pub mod error;
pub mod field;
pub mod geometry;
pub mod ids;
pub mod time;

pub use error::{ExportError, ExportResult};
pub use field::Field;
pub use geometry::Geometry;
pub use ids::{BandName, ProductId, SatelliteId, SensorId};
pub use time::{DateRange, DateUnit, Timestamp};
