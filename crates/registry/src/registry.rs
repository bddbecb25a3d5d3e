//! The process-wide product registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::info;

use imagery_common::{BandName, ExportError, ExportResult, ProductId, SatelliteId, SensorId};

use crate::configmap::ConfigMap;
use crate::version::VersionTag;

/// Builtin configmap shipped with the crate.
pub const BUILTIN_CONFIGMAP: &str = include_str!("../meta/configmap.yaml");
/// Builtin lock value the configmap version must match.
const BUILTIN_LOCK: &str = include_str!("../meta/registry.lock");

/// Ordered product table for one sensor: product -> constituent bands.
pub type ProductMap = BTreeMap<ProductId, Vec<BandName>>;

/// Static registry mapping satellites to sensors to products.
///
/// Constructed once at startup and passed by `Arc` to every component
/// that needs it; read-only afterwards, so concurrent reads are safe by
/// construction. Version mismatch against the lock value fails fast —
/// there is never a partially loaded registry.
#[derive(Debug, Clone)]
pub struct ProductRegistry {
    version: VersionTag,
    satellites: BTreeMap<SatelliteId, SatelliteRecord>,
    products: BTreeMap<SensorId, ProductMap>,
    sensor_to_satellite: BTreeMap<SensorId, SatelliteId>,
}

#[derive(Debug, Clone)]
struct SatelliteRecord {
    revisit_days: u32,
    sensors: BTreeMap<SensorId, SensorRecord>,
}

#[derive(Debug, Clone)]
struct SensorRecord {
    collection_id: String,
    cloud_property: Option<String>,
}

impl ProductRegistry {
    /// Build the registry from the configmap shipped with the crate.
    pub fn builtin() -> ExportResult<Self> {
        Self::from_parts(BUILTIN_CONFIGMAP, BUILTIN_LOCK)
    }

    /// Build the registry from external configmap and lock files.
    pub fn from_files<P: AsRef<Path>>(configmap: P, lock: P) -> ExportResult<Self> {
        let yaml = fs::read_to_string(configmap.as_ref()).map_err(|e| {
            ExportError::Config(format!(
                "Failed to read configmap {:?}: {}",
                configmap.as_ref(),
                e
            ))
        })?;
        let lock_value = fs::read_to_string(lock.as_ref()).map_err(|e| {
            ExportError::Config(format!("Failed to read lock {:?}: {}", lock.as_ref(), e))
        })?;
        Self::from_parts(&yaml, &lock_value)
    }

    fn from_parts(yaml: &str, lock: &str) -> ExportResult<Self> {
        let map =
            ConfigMap::parse(yaml).map_err(|e| ExportError::Config(format!("{:#}", e)))?;

        let version: VersionTag = map
            .version
            .parse()
            .map_err(|e| ExportError::Config(format!("configmap version: {}", e)))?;
        let lock_version: VersionTag = lock
            .parse()
            .map_err(|e| ExportError::Config(format!("registry lock: {}", e)))?;

        if version != lock_version {
            return Err(ExportError::VersionMismatch {
                expected: lock_version.to_string(),
                found: version.to_string(),
            });
        }

        let mut satellites = BTreeMap::new();
        let mut sensor_to_satellite = BTreeMap::new();
        for (sat_id, entry) in &map.satellites {
            let sat_id = SatelliteId::new(sat_id.clone());
            let mut sensors = BTreeMap::new();
            for (sensor_id, sensor) in &entry.sensors {
                let sensor_id = SensorId::new(sensor_id.clone());
                sensor_to_satellite.insert(sensor_id.clone(), sat_id.clone());
                sensors.insert(
                    sensor_id,
                    SensorRecord {
                        collection_id: sensor.collection.clone(),
                        cloud_property: sensor.cloud_property.clone(),
                    },
                );
            }
            satellites.insert(
                sat_id,
                SatelliteRecord {
                    revisit_days: entry.revisit_days,
                    sensors,
                },
            );
        }

        let mut products = BTreeMap::new();
        for (sensor_id, table) in &map.products {
            let table: ProductMap = table
                .iter()
                .map(|(product, bands)| {
                    (
                        ProductId::new(product.clone()),
                        bands.iter().map(|b| BandName::new(b.clone())).collect(),
                    )
                })
                .collect();
            products.insert(SensorId::new(sensor_id.clone()), table);
        }

        info!(
            version = %version,
            satellites = satellites.len(),
            sensors = sensor_to_satellite.len(),
            "Loaded product registry"
        );

        Ok(Self {
            version,
            satellites,
            products,
            sensor_to_satellite,
        })
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// All registered satellite IDs.
    pub fn satellites(&self) -> Vec<SatelliteId> {
        self.satellites.keys().cloned().collect()
    }

    /// All registered sensor IDs across every satellite.
    pub fn sensors(&self) -> Vec<SensorId> {
        self.sensor_to_satellite.keys().cloned().collect()
    }

    pub fn contains_sensor(&self, sensor: &SensorId) -> bool {
        self.sensor_to_satellite.contains_key(sensor)
    }

    pub fn contains_satellite(&self, satellite: &SatelliteId) -> bool {
        self.satellites.contains_key(satellite)
    }

    /// The satellite a sensor belongs to.
    pub fn satellite_for(&self, sensor: &SensorId) -> ExportResult<SatelliteId> {
        self.sensor_to_satellite
            .get(sensor)
            .cloned()
            .ok_or_else(|| ExportError::InvalidSensor(sensor.to_string()))
    }

    /// The full product table for a sensor.
    pub fn products_for(&self, sensor: &SensorId) -> ExportResult<&ProductMap> {
        self.products
            .get(sensor)
            .ok_or_else(|| ExportError::InvalidSensor(sensor.to_string()))
    }

    /// Revisit cadence in days for a satellite.
    pub fn revisit_days(&self, satellite: &SatelliteId) -> ExportResult<u32> {
        self.satellites
            .get(satellite)
            .map(|s| s.revisit_days)
            .ok_or_else(|| ExportError::InvalidSatellite(satellite.to_string()))
    }

    /// The remote service's dataset identifier for a sensor.
    pub fn collection_id(&self, sensor: &SensorId) -> ExportResult<&str> {
        self.sensor_record(sensor)
            .map(|r| r.collection_id.as_str())
    }

    /// The per-image cloud-cover property for a sensor, if it has one.
    pub fn cloud_property(&self, sensor: &SensorId) -> ExportResult<Option<&str>> {
        self.sensor_record(sensor)
            .map(|r| r.cloud_property.as_deref())
    }

    fn sensor_record(&self, sensor: &SensorId) -> ExportResult<&SensorRecord> {
        let satellite = self.satellite_for(sensor)?;
        self.satellites
            .get(&satellite)
            .and_then(|s| s.sensors.get(sensor))
            .ok_or_else(|| ExportError::InvalidSensor(sensor.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads() {
        let registry = ProductRegistry::builtin().unwrap();
        assert!(registry.contains_sensor(&SensorId::new("L2A")));
        assert!(registry.contains_satellite(&SatelliteId::new("S2")));
    }

    #[test]
    fn test_lookup_closure() {
        // Every sensor resolves to a registered satellite and carries a
        // non-empty product table with a BASE entry.
        let registry = ProductRegistry::builtin().unwrap();
        let satellites = registry.satellites();
        for sensor in registry.sensors() {
            let satellite = registry.satellite_for(&sensor).unwrap();
            assert!(satellites.contains(&satellite));

            let products = registry.products_for(&sensor).unwrap();
            assert!(!products.is_empty());
            assert!(products.contains_key(&ProductId::base()));
        }
    }

    #[test]
    fn test_collection_ids() {
        let registry = ProductRegistry::builtin().unwrap();
        assert_eq!(
            registry.collection_id(&SensorId::new("L2A")).unwrap(),
            "COPERNICUS/S2_SR"
        );
        assert_eq!(
            registry.collection_id(&SensorId::new("L8SR")).unwrap(),
            "LANDSAT/LC08/C01/T1_SR"
        );
    }

    #[test]
    fn test_revisit_days() {
        let registry = ProductRegistry::builtin().unwrap();
        assert_eq!(registry.revisit_days(&SatelliteId::new("S2")).unwrap(), 5);
        assert_eq!(registry.revisit_days(&SatelliteId::new("L8")).unwrap(), 16);
    }

    #[test]
    fn test_unknown_sensor_fails() {
        let registry = ProductRegistry::builtin().unwrap();
        let result = registry.satellite_for(&SensorId::new("NOPE"));
        assert!(matches!(result, Err(ExportError::InvalidSensor(_))));
    }

    #[test]
    fn test_version_mismatch_is_fatal() {
        let result = ProductRegistry::from_parts(BUILTIN_CONFIGMAP, "v9.9.9");
        assert!(matches!(
            result,
            Err(ExportError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_configmap_is_fatal() {
        let result = ProductRegistry::from_parts("not: [valid", "v0.4.0");
        assert!(matches!(result, Err(ExportError::Config(_))));
    }

    #[test]
    fn test_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let configmap = dir.path().join("configmap.yaml");
        let lock = dir.path().join("registry.lock");
        std::fs::write(&configmap, BUILTIN_CONFIGMAP).unwrap();
        std::fs::write(&lock, "v0.4.0\n").unwrap();

        let registry = ProductRegistry::from_files(&configmap, &lock).unwrap();
        assert_eq!(registry.version().to_string(), "v0.4.0");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProductRegistry::from_files(
            dir.path().join("absent.yaml"),
            dir.path().join("absent.lock"),
        );
        assert!(matches!(result, Err(ExportError::Config(_))));
    }
}
