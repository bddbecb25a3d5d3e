//! Serde model and validation for the registry configmap document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configmap document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMap {
    /// Must match the separately stored lock value.
    pub version: String,
    pub satellites: BTreeMap<String, SatelliteEntry>,
    /// Sensor ID -> product ID -> ordered constituent band list.
    pub products: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteEntry {
    #[serde(default)]
    pub name: Option<String>,
    /// Revisit cadence in days.
    pub revisit_days: u32,
    pub sensors: BTreeMap<String, SensorEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorEntry {
    /// The remote service's dataset identifier for this sensor.
    pub collection: String,
    /// Metadata property holding per-image cloud cover, if any.
    #[serde(default)]
    pub cloud_property: Option<String>,
}

impl ConfigMap {
    /// Parse a configmap from YAML text and validate its structure.
    pub fn parse(yaml: &str) -> Result<Self> {
        let map: ConfigMap =
            serde_yaml::from_str(yaml).context("Failed to parse configmap YAML")?;
        map.validate()?;
        Ok(map)
    }

    /// Load and validate a configmap from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configmap from {:?}", path.as_ref()))?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.satellites.is_empty(),
            "Configmap must declare at least one satellite"
        );

        // Every sensor belongs to exactly one satellite.
        let mut seen_sensors: BTreeMap<&str, &str> = BTreeMap::new();
        for (sat_id, sat) in &self.satellites {
            anyhow::ensure!(
                !sat.sensors.is_empty(),
                "Satellite {} declares no sensors",
                sat_id
            );
            for (sensor_id, sensor) in &sat.sensors {
                if let Some(existing) = seen_sensors.insert(sensor_id, sat_id) {
                    anyhow::bail!(
                        "Sensor {} declared under both {} and {}",
                        sensor_id,
                        existing,
                        sat_id
                    );
                }
                anyhow::ensure!(
                    !sensor.collection.is_empty(),
                    "Sensor {} has an empty collection identifier",
                    sensor_id
                );
            }
        }

        // Every sensor carries a product table with a BASE entry; every
        // product's band list is non-empty.
        for sensor_id in seen_sensors.keys() {
            let products = self
                .products
                .get(*sensor_id)
                .with_context(|| format!("Sensor {} has no product table", sensor_id))?;
            anyhow::ensure!(
                products.contains_key("BASE"),
                "Sensor {} product table is missing BASE",
                sensor_id
            );
            for (product_id, bands) in products {
                anyhow::ensure!(
                    !bands.is_empty(),
                    "Product {} for sensor {} has an empty band list",
                    product_id,
                    sensor_id
                );
            }
        }

        // No orphan product tables.
        for sensor_id in self.products.keys() {
            anyhow::ensure!(
                seen_sensors.contains_key(sensor_id.as_str()),
                "Product table references unknown sensor {}",
                sensor_id
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version: "0.1.0"
satellites:
  S2:
    revisit_days: 5
    sensors:
      L2A:
        collection: COPERNICUS/S2_SR
products:
  L2A:
    BASE: [B2, B3, B4, B8]
    NDVI: [NDVI]
"#;

    #[test]
    fn test_parse_minimal() {
        let map = ConfigMap::parse(MINIMAL).unwrap();
        assert_eq!(map.version, "0.1.0");
        assert_eq!(map.satellites["S2"].revisit_days, 5);
        assert_eq!(map.products["L2A"]["NDVI"], vec!["NDVI"]);
    }

    #[test]
    fn test_missing_base_rejected() {
        let yaml = MINIMAL.replace("BASE", "NOTBASE");
        assert!(ConfigMap::parse(&yaml).is_err());
    }

    #[test]
    fn test_missing_product_table_rejected() {
        let yaml = MINIMAL.replace("  L2A:\n    BASE", "  L2X:\n    BASE");
        assert!(ConfigMap::parse(&yaml).is_err());
    }

    #[test]
    fn test_duplicate_sensor_rejected() {
        let yaml = r#"
version: "0.1.0"
satellites:
  S2:
    revisit_days: 5
    sensors:
      L2A: { collection: COPERNICUS/S2_SR }
  L8:
    revisit_days: 16
    sensors:
      L2A: { collection: LANDSAT/LC08 }
products:
  L2A:
    BASE: [B2]
"#;
        assert!(ConfigMap::parse(yaml).is_err());
    }

    #[test]
    fn test_empty_band_list_rejected() {
        let yaml = MINIMAL.replace("NDVI: [NDVI]", "NDVI: []");
        assert!(ConfigMap::parse(&yaml).is_err());
    }
}
