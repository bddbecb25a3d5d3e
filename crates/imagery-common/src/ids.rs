//! Identifier newtypes for satellites, sensors, products and bands.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Unique identifier for a satellite platform (e.g. "S2", "L8").
    SatelliteId
}

string_id! {
    /// Unique identifier for a sensor data product level (e.g. "L2A", "L8SR").
    ///
    /// Every sensor belongs to exactly one satellite.
    SensorId
}

string_id! {
    /// Identifier for an exportable product, scoped to a sensor.
    ProductId
}

string_id! {
    /// Name of a single raster band (e.g. "B4", "NDVI").
    BandName
}

impl ProductId {
    /// The reserved product enumerating the bands present on every raw
    /// acquisition of a sensor. BASE bands are never generated.
    pub const BASE: &'static str = "BASE";

    pub fn base() -> Self {
        Self(Self::BASE.to_string())
    }

    pub fn is_base(&self) -> bool {
        self.0 == Self::BASE
    }
}
