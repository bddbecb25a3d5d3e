//! Per-satellite provenance tables.
//!
//! Images and collections are verified by substring-matching a
//! metadata property; composites get their identity restored from the
//! canonical rebuild entries. New satellites must be added here as
//! well as to the registry configmap.

/// A metadata property and the substring it must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenanceCheck {
    pub property: &'static str,
    pub pattern: &'static str,
}

/// The canonical identity property written back onto composites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildId {
    pub property: &'static str,
    pub value: &'static str,
}

/// Image verification rule for a (satellite, mode) pair. `mode` is
/// either the satellite itself or one of its sensors.
pub fn image_check(satellite: &str, mode: &str) -> Option<ProvenanceCheck> {
    let (property, pattern) = match (satellite, mode) {
        ("S2", "S2") => ("PRODUCT_ID", "S2"),
        ("S2", "L2A") => ("PRODUCT_ID", "L2A"),
        ("S2", "L1C") => ("PRODUCT_ID", "L1C"),
        ("L8", "L8") => ("LANDSAT_ID", "LC08"),
        ("L8", "L8SR") => ("LANDSAT_ID", "L1TP"),
        _ => return None,
    };
    Some(ProvenanceCheck { property, pattern })
}

/// Collection verification rule for a (satellite, mode) pair, matched
/// against the joined `product_tags` list.
pub fn collection_check(satellite: &str, mode: &str) -> Option<ProvenanceCheck> {
    let pattern = match (satellite, mode) {
        ("S2", "S2") => "msi",
        ("S2", "L2A") => "reflectance",
        ("S2", "L1C") => "radiance",
        ("L8", "L8") => "lc08",
        ("L8", "L8SR") => "l8sr",
        _ => return None,
    };
    Some(ProvenanceCheck {
        property: "product_tags",
        pattern,
    })
}

/// Canonical identity restored after mosaicking or band algebra.
pub fn rebuild_id(sensor: &str) -> Option<RebuildId> {
    let (property, value) = match sensor {
        "L2A" => ("PRODUCT_ID", "S2X_MSIL2A"),
        "L1C" => ("PRODUCT_ID", "S2X_MSIL1C"),
        "L8SR" => ("LANDSAT_ID", "LC08_L1TP"),
        _ => return None,
    };
    Some(RebuildId { property, value })
}

/// Tags stamped onto a mosaic collection for a sensor.
pub fn mosaic_tags(sensor: &str) -> Option<&'static [&'static str]> {
    match sensor {
        "L2A" => Some(&["msi", "reflectance"]),
        "L1C" => Some(&["msi", "radiance"]),
        "L8SR" => Some(&["lc08", "l8sr"]),
        _ => None,
    }
}

/// Property holding the product generation instant for a satellite.
pub fn generation_field(satellite: &str) -> Option<&'static str> {
    match satellite {
        "S2" => Some("GENERATION_TIME"),
        "L8" => Some("LEVEL1_PRODUCTION_DATE"),
        _ => None,
    }
}
