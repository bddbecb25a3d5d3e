//! Scene and dataset seeds for the in-memory compute service.

use std::collections::HashMap;

use compute_client::PropertyValue;
use imagery_common::{BandName, Geometry, Timestamp};

/// A single raw acquisition seeded into a dataset.
#[derive(Debug, Clone)]
pub struct SceneSeed {
    pub acquired: Timestamp,
    pub bands: Vec<BandName>,
    pub properties: HashMap<String, PropertyValue>,
    pub footprint: Geometry,
}

impl SceneSeed {
    pub fn with_property(mut self, key: &str, value: PropertyValue) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }

    pub fn with_cloud_cover(self, property: &str, percentage: f64) -> Self {
        self.with_property(property, PropertyValue::Number(percentage))
    }

    pub fn with_footprint(mut self, footprint: Geometry) -> Self {
        self.footprint = footprint;
        self
    }
}

/// A seeded dataset: scenes plus collection-level properties.
#[derive(Debug, Clone, Default)]
pub struct DatasetSeed {
    pub scenes: Vec<SceneSeed>,
    pub properties: HashMap<String, PropertyValue>,
}

impl DatasetSeed {
    pub fn new(scenes: Vec<SceneSeed>, properties: HashMap<String, PropertyValue>) -> Self {
        Self { scenes, properties }
    }
}

/// Footprint used by the canned scenes: a small field near Bengaluru.
pub fn default_footprint() -> Geometry {
    Geometry::rect(77.0, 12.5, 77.3, 12.8)
}

/// The Sentinel-2 L2A base band set matching the builtin registry.
pub fn l2a_base_bands() -> Vec<BandName> {
    ["B1", "B2", "B3", "B4", "B5", "B6", "B7", "B8", "B8A", "B9", "B11", "B12"]
        .iter()
        .map(|b| BandName::new(*b))
        .collect()
}

/// The Landsat-8 SR base band set matching the builtin registry.
pub fn l8sr_base_bands() -> Vec<BandName> {
    ["B1", "B2", "B3", "B4", "B5", "B6", "B7", "B10", "B11"]
        .iter()
        .map(|b| BandName::new(*b))
        .collect()
}

/// A realistic Sentinel-2 L2A acquisition.
pub fn l2a_scene(acquired: &str) -> SceneSeed {
    let acquired = Timestamp::from_iso8601(acquired).expect("valid fixture timestamp");
    let generated = acquired.advance(2, imagery_common::DateUnit::Hours);

    let mut properties = HashMap::new();
    properties.insert(
        "PRODUCT_ID".to_string(),
        PropertyValue::Text(format!(
            "S2B_MSIL2A_{}T051939_N0214_R033_T43PFS",
            acquired.date_string().replace('-', "")
        )),
    );
    properties.insert(
        "CLOUDY_PIXEL_PERCENTAGE".to_string(),
        PropertyValue::Number(7.3),
    );
    properties.insert(
        "GENERATION_TIME".to_string(),
        PropertyValue::Integer(generated.epoch_ms()),
    );

    SceneSeed {
        acquired,
        bands: l2a_base_bands(),
        properties,
        footprint: default_footprint(),
    }
}

/// A realistic Landsat-8 surface-reflectance acquisition.
pub fn l8sr_scene(acquired: &str) -> SceneSeed {
    let acquired = Timestamp::from_iso8601(acquired).expect("valid fixture timestamp");
    let generated = acquired.advance(8, imagery_common::DateUnit::Days);

    let mut properties = HashMap::new();
    properties.insert(
        "LANDSAT_ID".to_string(),
        PropertyValue::Text(format!(
            "LC08_L1TP_144052_{}_01_T1",
            acquired.date_string().replace('-', "")
        )),
    );
    properties.insert("CLOUD_COVER".to_string(), PropertyValue::Number(12.0));
    properties.insert(
        "LEVEL1_PRODUCTION_DATE".to_string(),
        PropertyValue::Integer(generated.epoch_ms()),
    );

    SceneSeed {
        acquired,
        bands: l8sr_base_bands(),
        properties,
        footprint: default_footprint(),
    }
}

/// Collection-level properties of the Sentinel-2 SR dataset.
pub fn s2_sr_dataset_properties() -> HashMap<String, PropertyValue> {
    let mut properties = HashMap::new();
    properties.insert(
        "product_tags".to_string(),
        PropertyValue::List(
            ["copernicus", "esa", "msi", "reflectance", "sentinel"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        ),
    );
    properties
}

/// Collection-level properties of the Landsat-8 SR dataset.
pub fn l8_sr_dataset_properties() -> HashMap<String, PropertyValue> {
    let mut properties = HashMap::new();
    properties.insert(
        "product_tags".to_string(),
        PropertyValue::List(
            ["landsat", "lc08", "l8sr", "usgs"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        ),
    );
    properties
}
