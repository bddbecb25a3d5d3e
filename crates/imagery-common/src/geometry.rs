//! Region-of-interest geometry passed to the remote service.

use serde::{Deserialize, Serialize};

/// A closed lon/lat ring describing an area of interest.
///
/// Plain data only: all spatial filtering and clipping happens on the
/// remote compute service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Polygon exterior ring as (lon, lat) pairs. The first vertex is
    /// not repeated at the end.
    pub ring: Vec<(f64, f64)>,
}

impl Geometry {
    pub fn new(ring: Vec<(f64, f64)>) -> Self {
        Self { ring }
    }

    /// Axis-aligned rectangle helper.
    pub fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            ring: vec![
                (min_lon, min_lat),
                (max_lon, min_lat),
                (max_lon, max_lat),
                (min_lon, max_lat),
            ],
        }
    }

    /// Bounding box as (min_lon, min_lat, max_lon, max_lat).
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_lon = f64::INFINITY;
        let mut min_lat = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        let mut max_lat = f64::NEG_INFINITY;

        for &(lon, lat) in &self.ring {
            min_lon = min_lon.min(lon);
            min_lat = min_lat.min(lat);
            max_lon = max_lon.max(lon);
            max_lat = max_lat.max(lat);
        }

        (min_lon, min_lat, max_lon, max_lat)
    }

    /// True if the bounding boxes of two geometries overlap.
    pub fn intersects_bounds(&self, other: &Geometry) -> bool {
        let (a_min_lon, a_min_lat, a_max_lon, a_max_lat) = self.bounds();
        let (b_min_lon, b_min_lat, b_max_lon, b_max_lat) = other.bounds();

        a_min_lon <= b_max_lon
            && b_min_lon <= a_max_lon
            && a_min_lat <= b_max_lat
            && b_min_lat <= a_max_lat
    }
}
