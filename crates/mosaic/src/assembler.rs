//! Assembling filtered image collections and same-day mosaics.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use compute_client::{
    CollectionHandle, ComputeService, ImageHandle, PixelPrecision, PropertyValue,
};
use imagery_common::{
    DateRange, ExportError, ExportResult, Geometry, SatelliteId, SensorId, Timestamp,
};
use registry::ProductRegistry;

use crate::provenance;
use crate::temporal::{self, DateSet};
use crate::types::MosaicSet;

/// Builds filtered time series and mosaics them into one image per
/// unique acquisition day.
///
/// Remote faults are wrapped with the failing stage and surfaced once;
/// retry policy belongs to the caller.
#[derive(Clone)]
pub struct CollectionAssembler {
    service: Arc<dyn ComputeService>,
    registry: Arc<ProductRegistry>,
}

impl CollectionAssembler {
    pub fn new(service: Arc<dyn ComputeService>, registry: Arc<ProductRegistry>) -> Self {
        Self { service, registry }
    }

    pub fn registry(&self) -> &Arc<ProductRegistry> {
        &self.registry
    }

    /// Resolve a verification mode (sensor or satellite ID) to its
    /// satellite.
    fn resolve_mode(&self, mode: &str) -> ExportResult<SatelliteId> {
        let sensor = SensorId::new(mode);
        if self.registry.contains_sensor(&sensor) {
            return self.registry.satellite_for(&sensor);
        }
        let satellite = SatelliteId::new(mode);
        if self.registry.contains_satellite(&satellite) {
            return Ok(satellite);
        }
        Err(ExportError::InvalidMode(mode.to_string()))
    }

    /// Check an image's provenance tag against a sensor or satellite
    /// identity pattern.
    ///
    /// A missing provenance property verifies as `false`, not as an
    /// error: absence of identity is an answer.
    pub async fn verify_image(&self, image: ImageHandle, mode: &str) -> ExportResult<bool> {
        let satellite = self.resolve_mode(mode)?;
        let check = provenance::image_check(satellite.as_str(), mode).ok_or_else(|| {
            ExportError::Config(format!("no image provenance rule for mode {}", mode))
        })?;

        let value = self
            .service
            .image_property(image, check.property)
            .await
            .map_err(|e| ExportError::remote("verification", e))?;

        Ok(match value {
            Some(v) => v.match_text().contains(check.pattern),
            None => false,
        })
    }

    /// Check a collection's `product_tags` against a sensor or
    /// satellite identity pattern.
    pub async fn verify_collection(
        &self,
        collection: CollectionHandle,
        mode: &str,
    ) -> ExportResult<bool> {
        let satellite = self.resolve_mode(mode)?;
        let check = provenance::collection_check(satellite.as_str(), mode).ok_or_else(|| {
            ExportError::Config(format!("no collection provenance rule for mode {}", mode))
        })?;

        let value = self
            .service
            .collection_property(collection, check.property)
            .await
            .map_err(|e| ExportError::remote("verification", e))?;

        Ok(match value {
            Some(v) => v.match_text().contains(check.pattern),
            None => false,
        })
    }

    /// Build a sensor's collection filtered by region, date range and
    /// optionally by cloud cover (strictly below the threshold).
    ///
    /// The caller-facing range is inclusive at both ends; the exclusive
    /// wire end is one day past `range.end`.
    #[instrument(skip(self, region), fields(sensor = %sensor))]
    pub async fn assemble_collection(
        &self,
        sensor: &SensorId,
        region: &Geometry,
        range: &DateRange,
        cloud_cover_max: Option<f64>,
    ) -> ExportResult<CollectionHandle> {
        let dataset = self.registry.collection_id(sensor)?.to_string();

        let collection = self
            .service
            .load_collection(&dataset)
            .await
            .map_err(|e| ExportError::remote("filtering", e))?;

        let collection = self
            .service
            .filter_bounds(collection, region)
            .await
            .map_err(|e| ExportError::remote("filtering", e))?;

        let collection = self
            .service
            .filter_date_range(
                collection,
                range.start.epoch_ms(),
                range.exclusive_end().epoch_ms(),
            )
            .await
            .map_err(|e| ExportError::remote("filtering", e))?;

        let collection = match cloud_cover_max {
            Some(threshold) => {
                let property = self.registry.cloud_property(sensor)?.ok_or_else(|| {
                    ExportError::Config(format!(
                        "sensor {} has no cloud-cover property to filter on",
                        sensor
                    ))
                })?;
                self.service
                    .filter_metadata_lt(collection, property, threshold)
                    .await
                    .map_err(|e| ExportError::remote("filtering", e))?
            }
            None => collection,
        };

        debug!(dataset = %dataset, "Assembled filtered collection");
        Ok(collection)
    }

    /// Extract a single image by positional index. Negative indices
    /// count from the end (-1 = latest).
    pub async fn extract_image(
        &self,
        collection: CollectionHandle,
        index: i64,
    ) -> ExportResult<ImageHandle> {
        let images = self
            .service
            .image_list(collection)
            .await
            .map_err(|e| ExportError::remote("extraction", e))?;

        let len = images.len() as i64;
        let resolved = if index < 0 { len + index } else { index };
        if resolved < 0 || resolved >= len {
            return Err(ExportError::EmptyResult(format!(
                "index {} out of range for collection of {} images",
                index, len
            )));
        }

        Ok(images[resolved as usize])
    }

    /// Extract every image acquired on `date`'s calendar day.
    pub async fn extract_images_for_date(
        &self,
        collection: CollectionHandle,
        date: &Timestamp,
    ) -> ExportResult<Vec<ImageHandle>> {
        let day_start = date.day_start();
        let filtered = self
            .service
            .filter_date_range(
                collection,
                day_start.epoch_ms(),
                day_start.next_day().epoch_ms(),
            )
            .await
            .map_err(|e| ExportError::remote("extraction", e))?;

        let images = self
            .service
            .image_list(filtered)
            .await
            .map_err(|e| ExportError::remote("extraction", e))?;

        if images.is_empty() {
            return Err(ExportError::EmptyResult(format!(
                "no image on {}",
                date.date_string()
            )));
        }

        Ok(images)
    }

    /// Restore the properties a transform erased: acquisition instant,
    /// canonical provenance id, optional pixel precision and footprint.
    ///
    /// Mandatory after every transform that can erase identity
    /// (mosaicking, band algebra).
    pub async fn rebuild_metadata(
        &self,
        image: ImageHandle,
        sensor: &SensorId,
        acquired: &Timestamp,
        precision: Option<PixelPrecision>,
        footprint: Option<&Geometry>,
    ) -> ExportResult<ImageHandle> {
        if !self.registry.contains_sensor(sensor) {
            return Err(ExportError::InvalidSensor(sensor.to_string()));
        }
        let rebuild = provenance::rebuild_id(sensor.as_str()).ok_or_else(|| {
            ExportError::Config(format!("metadata rebuild not implemented for {}", sensor))
        })?;

        let mut image = image;
        if let Some(precision) = precision {
            image = self
                .service
                .cast(image, precision)
                .await
                .map_err(|e| ExportError::remote("metadata rebuild", e))?;
        }
        if let Some(region) = footprint {
            image = self
                .service
                .set_footprint(image, region)
                .await
                .map_err(|e| ExportError::remote("metadata rebuild", e))?;
        }

        let mut properties = HashMap::new();
        properties.insert(
            "system:time_start".to_string(),
            PropertyValue::Integer(acquired.epoch_ms()),
        );
        properties.insert(
            rebuild.property.to_string(),
            PropertyValue::Text(rebuild.value.to_string()),
        );

        self.service
            .set_image_properties(image, &properties)
            .await
            .map_err(|e| ExportError::remote("metadata rebuild", e))
    }

    /// Composite every image acquired on `date` into one mosaic, with
    /// metadata rebuilt for `sensor`.
    #[instrument(skip(self), fields(sensor = %sensor, date = %date.date_string()))]
    pub async fn mosaic_for_date(
        &self,
        collection: CollectionHandle,
        sensor: &SensorId,
        date: &Timestamp,
    ) -> ExportResult<ImageHandle> {
        if !self.registry.contains_sensor(sensor) {
            return Err(ExportError::InvalidSensor(sensor.to_string()));
        }

        let images = self.extract_images_for_date(collection, date).await?;

        let day_collection = self
            .service
            .collection_from_images(&images)
            .await
            .map_err(|e| ExportError::remote("mosaicking", e))?;
        let composite = self
            .service
            .mosaic(day_collection)
            .await
            .map_err(|e| ExportError::remote("mosaicking", e))?;

        self.rebuild_metadata(composite, sensor, date, None, None)
            .await
    }

    /// Build the full mosaic set: one metadata-complete mosaic per
    /// unique acquisition day, ascending, earliest instant representing
    /// each day.
    #[instrument(skip(self), fields(sensor = %sensor))]
    pub async fn assemble_mosaic_set(
        &self,
        collection: CollectionHandle,
        sensor: &SensorId,
    ) -> ExportResult<MosaicSet> {
        if !self.registry.contains_sensor(sensor) {
            return Err(ExportError::InvalidSensor(sensor.to_string()));
        }

        let dates = self.acquisition_dates(collection).await?;

        let mut images = Vec::with_capacity(dates.len());
        for date in &dates {
            let mosaic = self.mosaic_for_date(collection, sensor, date).await?;
            images.push(mosaic);
        }

        let tags = provenance::mosaic_tags(sensor.as_str()).ok_or_else(|| {
            ExportError::Config(format!("no mosaic tags for sensor {}", sensor))
        })?;
        let tagged = self
            .service
            .collection_from_images(&images)
            .await
            .map_err(|e| ExportError::remote("mosaicking", e))?;
        let mut properties = HashMap::new();
        properties.insert(
            "product_tags".to_string(),
            PropertyValue::List(tags.iter().map(|t| t.to_string()).collect()),
        );
        let tagged = self
            .service
            .set_collection_properties(tagged, &properties)
            .await
            .map_err(|e| ExportError::remote("mosaicking", e))?;

        debug!(count = images.len(), "Assembled mosaic set");
        MosaicSet::new(tagged, images, dates)
    }

    /// Unique acquisition days in the collection, ascending.
    pub async fn acquisition_dates(
        &self,
        collection: CollectionHandle,
    ) -> ExportResult<Vec<Timestamp>> {
        let images = self
            .service
            .image_list(collection)
            .await
            .map_err(|e| ExportError::remote("date extraction", e))?;

        let mut stamps = Vec::with_capacity(images.len());
        for image in images {
            let ms = self
                .service
                .acquisition_time_ms(image)
                .await
                .map_err(|e| ExportError::remote("date extraction", e))?
                .ok_or_else(|| {
                    ExportError::remote("date extraction", "image has no acquisition time")
                })?;
            stamps.push(Timestamp::from_epoch_ms(ms)?);
        }

        Ok(temporal::dedup_daily(stamps))
    }

    /// Acquisition and generation instants for an image of `satellite`.
    pub async fn date_set(
        &self,
        image: ImageHandle,
        satellite: &SatelliteId,
    ) -> ExportResult<DateSet> {
        if !self.registry.contains_satellite(satellite) {
            return Err(ExportError::InvalidSatellite(satellite.to_string()));
        }
        if !self.verify_image(image, satellite.as_str()).await? {
            return Err(ExportError::ProvenanceMismatch {
                expected: satellite.to_string(),
            });
        }

        let acquired_ms = self
            .service
            .acquisition_time_ms(image)
            .await
            .map_err(|e| ExportError::remote("date extraction", e))?
            .ok_or_else(|| {
                ExportError::remote("date extraction", "image has no acquisition time")
            })?;
        let acquired = Timestamp::from_epoch_ms(acquired_ms)?;

        let field = provenance::generation_field(satellite.as_str()).ok_or_else(|| {
            ExportError::Config(format!("no generation-time field for {}", satellite))
        })?;
        let value = self
            .service
            .image_property(image, field)
            .await
            .map_err(|e| ExportError::remote("date extraction", e))?
            .ok_or_else(|| {
                ExportError::remote("date extraction", format!("missing property {}", field))
            })?;

        let generated = match value {
            PropertyValue::Integer(ms) => Timestamp::from_epoch_ms(ms)?,
            PropertyValue::Text(s) => Timestamp::from_iso8601(&s)?,
            other => {
                return Err(ExportError::remote(
                    "date extraction",
                    format!("unexpected {} value: {:?}", field, other),
                ))
            }
        };

        Ok(DateSet {
            acquired,
            generated,
        })
    }
}
