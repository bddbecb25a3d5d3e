//! Applying band-algebra formulas and rebuilding result metadata.

use std::sync::Arc;

use tracing::{debug, instrument};

use compute_client::{ComputeService, ImageHandle, PixelPrecision};
use imagery_common::{BandName, ExportError, ExportResult, ProductId, SensorId, Timestamp};
use mosaic::CollectionAssembler;
use registry::ProductRegistry;

use crate::formula::{BandFormula, FormulaTable};

/// Computes derived single-band images for registered products.
///
/// Construction validates the formula table for completeness against
/// the registry, so an unservable product combination is a boot-time
/// failure rather than a mid-request surprise.
#[derive(Clone)]
pub struct IndexEngine {
    service: Arc<dyn ComputeService>,
    registry: Arc<ProductRegistry>,
    assembler: CollectionAssembler,
    table: FormulaTable,
}

impl IndexEngine {
    pub fn new(
        service: Arc<dyn ComputeService>,
        registry: Arc<ProductRegistry>,
    ) -> ExportResult<Self> {
        let table = FormulaTable::builtin();
        table.validate_against(&registry)?;

        let assembler = CollectionAssembler::new(service.clone(), registry.clone());
        Ok(Self {
            service,
            registry,
            assembler,
            table,
        })
    }

    /// Compute one derived band for `image`, renamed to the product ID,
    /// with metadata rebuilt (acquisition date from the source image,
    /// pixel precision forced to float).
    ///
    /// Validation is eager: unknown or formula-less products fail
    /// before any remote call is issued, so a caller requesting an
    /// impossible combination learns about it before any export task
    /// exists.
    #[instrument(skip(self), fields(product = %product, sensor = %sensor))]
    pub async fn compute_index(
        &self,
        image: ImageHandle,
        product: &ProductId,
        sensor: &SensorId,
    ) -> ExportResult<ImageHandle> {
        let satellite = self.registry.satellite_for(sensor)?;
        let products = self.registry.products_for(sensor)?;
        if !products.contains_key(product) {
            return Err(ExportError::UnsupportedProduct {
                satellite: satellite.to_string(),
                product: product.to_string(),
            });
        }

        let band = BandName::new(product.as_str());
        let formula = *self.table.lookup(&satellite, &band).ok_or_else(|| {
            ExportError::UnsupportedProduct {
                satellite: satellite.to_string(),
                product: product.to_string(),
            }
        })?;

        if !self.assembler.verify_image(image, sensor.as_str()).await? {
            return Err(ExportError::ProvenanceMismatch {
                expected: sensor.to_string(),
            });
        }

        let acquired_ms = self
            .service
            .acquisition_time_ms(image)
            .await
            .map_err(|e| ExportError::remote("band computation", e))?
            .ok_or_else(|| {
                ExportError::remote("band computation", "source image has no acquisition time")
            })?;
        let acquired = Timestamp::from_epoch_ms(acquired_ms)?;

        let result = self.apply_formula(image, &formula).await?;
        let renamed = self
            .service
            .rename_bands(result, &[band])
            .await
            .map_err(|e| ExportError::remote("band computation", e))?;

        debug!("Computed index band");
        self.assembler
            .rebuild_metadata(renamed, sensor, &acquired, Some(PixelPrecision::Float), None)
            .await
    }

    /// Run a formula through the client, without renaming or metadata.
    async fn apply_formula(
        &self,
        image: ImageHandle,
        formula: &BandFormula,
    ) -> ExportResult<ImageHandle> {
        match formula {
            BandFormula::NormalizedDifference { first, second } => self
                .service
                .normalized_difference(image, &BandName::new(*first), &BandName::new(*second))
                .await
                .map_err(|e| ExportError::remote("band computation", e)),
            BandFormula::Expression {
                expr,
                bands,
                constants,
                cube_root,
            } => {
                let bindings: Vec<(String, BandName)> = bands
                    .iter()
                    .map(|(role, band)| (role.to_string(), BandName::new(*band)))
                    .collect();
                let constants: Vec<(String, f64)> = constants
                    .iter()
                    .map(|(name, value)| (name.to_string(), *value))
                    .collect();

                let mut result = self
                    .service
                    .expression(image, expr, &bindings, &constants)
                    .await
                    .map_err(|e| ExportError::remote("band computation", e))?;

                if *cube_root {
                    result = self
                        .service
                        .cube_root(result)
                        .await
                        .map_err(|e| ExportError::remote("band computation", e))?;
                }

                Ok(result)
            }
        }
    }
}
