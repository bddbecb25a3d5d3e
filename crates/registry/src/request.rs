//! Validated client product requests.

use std::collections::BTreeSet;

use tracing::debug;

use imagery_common::{BandName, ExportError, ExportResult, ProductId, SatelliteId, SensorId};

use crate::registry::{ProductMap, ProductRegistry};

/// A validated product request for one sensor.
///
/// Construction validates the whole list against the registry — an
/// unknown product rejects the entire request, never yielding a
/// half-valid object — and resolves the ordered set of bands that must
/// be generated before export. Immutable after construction.
#[derive(Debug, Clone)]
pub struct RequestList {
    products: Vec<ProductId>,
    sensor: SensorId,
    satellite: SatelliteId,
    sensor_products: ProductMap,
    required_bands: Vec<BandName>,
}

impl RequestList {
    pub fn new(
        products: Vec<ProductId>,
        sensor: SensorId,
        registry: &ProductRegistry,
    ) -> ExportResult<Self> {
        let satellite = registry.satellite_for(&sensor)?;
        let sensor_products = registry.products_for(&sensor)?.clone();

        for product in &products {
            if !sensor_products.contains_key(product) {
                return Err(ExportError::InvalidRequest {
                    sensor: sensor.to_string(),
                    product: product.to_string(),
                });
            }
        }

        let required_bands = resolve_required_bands(&products, &sensor_products);
        debug!(
            sensor = %sensor,
            products = products.len(),
            required = required_bands.len(),
            "Resolved request list"
        );

        Ok(Self {
            products,
            sensor,
            satellite,
            sensor_products,
            required_bands,
        })
    }

    /// Requested products, in caller order.
    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    pub fn sensor(&self) -> &SensorId {
        &self.sensor
    }

    pub fn satellite(&self) -> &SatelliteId {
        &self.satellite
    }

    /// The sensor's full product table.
    pub fn sensor_products(&self) -> &ProductMap {
        &self.sensor_products
    }

    /// Band list for one requested product.
    pub fn bands_for(&self, product: &ProductId) -> Option<&[BandName]> {
        self.sensor_products.get(product).map(|b| b.as_slice())
    }

    /// Bands that must be generated: the ordered, duplicate-free union
    /// of the requested products' bands, minus the sensor's BASE bands.
    ///
    /// The order here decides the order in which generated bands are
    /// appended to an image before export, and therefore the band order
    /// any downstream table sees.
    pub fn required_bands(&self) -> &[BandName] {
        &self.required_bands
    }
}

fn resolve_required_bands(products: &[ProductId], table: &ProductMap) -> Vec<BandName> {
    let base: BTreeSet<&BandName> = table
        .get(&ProductId::base())
        .map(|bands| bands.iter().collect())
        .unwrap_or_default();

    let mut seen = BTreeSet::new();
    let mut required = Vec::new();
    for product in products {
        if let Some(bands) = table.get(product) {
            for band in bands {
                if seen.insert(band) && !base.contains(band) {
                    required.push(band.clone());
                }
            }
        }
    }

    required
}
