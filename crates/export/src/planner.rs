//! Building export task batches for single images and mosaic sets.

use std::sync::Arc;

use tracing::{debug, instrument};

use compute_client::{
    CollectionHandle, ComputeService, ExportDestination, ExportParams, ExportSpec, ImageHandle,
};
use imagery_common::{ExportError, ExportResult, Field, ProductId, Timestamp};
use indexing::IndexEngine;
use mosaic::CollectionAssembler;
use registry::{ProductRegistry, RequestList};

use crate::task::ExportTask;

/// Plans export task batches.
///
/// Planning is pure with respect to task side effects: every produced
/// task is unstarted, and a failed plan returns no tasks at all, so
/// re-running "build the task list" is always safe.
#[derive(Clone)]
pub struct ExportPlanner {
    service: Arc<dyn ComputeService>,
    assembler: CollectionAssembler,
    engine: IndexEngine,
}

impl ExportPlanner {
    /// Construction inherits the index engine's formula completeness
    /// check, so a planner only exists for a servable registry.
    pub fn new(
        service: Arc<dyn ComputeService>,
        registry: Arc<ProductRegistry>,
    ) -> ExportResult<Self> {
        let assembler = CollectionAssembler::new(service.clone(), registry.clone());
        let engine = IndexEngine::new(service.clone(), registry)?;
        Ok(Self {
            service,
            assembler,
            engine,
        })
    }

    /// Plan one export task per requested product for a single image.
    ///
    /// Every band in the request's `required_bands` is computed and
    /// appended to the image first; each product then selects its band
    /// subset into an independent export image.
    ///
    /// Postcondition: exactly one task per requested product.
    #[instrument(
        skip(self, image, request, field, destination, params, acquired),
        fields(sensor = %request.sensor(), field = %field.id, date = %acquired.date_string())
    )]
    pub async fn plan_image_export(
        &self,
        image: ImageHandle,
        request: &RequestList,
        field: &Field,
        destination: &ExportDestination,
        params: &ExportParams,
        acquired: &Timestamp,
    ) -> ExportResult<Vec<ExportTask>> {
        if !self
            .assembler
            .verify_image(image, request.sensor().as_str())
            .await?
        {
            return Err(ExportError::ProvenanceMismatch {
                expected: request.sensor().to_string(),
            });
        }

        let enriched = self.attach_required_bands(image, request).await?;
        let tasks = self
            .tasks_for_image(enriched, request, field, destination, params, acquired)
            .await?;

        if tasks.len() != request.products().len() {
            return Err(ExportError::TaskMismatch(format!(
                "{} products produced {} tasks",
                request.products().len(),
                tasks.len()
            )));
        }

        debug!(tasks = tasks.len(), "Planned image export");
        Ok(tasks)
    }

    /// Plan a nested task batch for a time series: the collection is
    /// reduced to one mosaic per unique acquisition day, every required
    /// band is generated per mosaic, and each day yields one task per
    /// requested product.
    ///
    /// Postconditions: the outer list length equals the mosaic set's
    /// date count, and every inner list length equals the requested
    /// product count.
    #[instrument(
        skip(self, collection, request, field, destination, params),
        fields(sensor = %request.sensor(), field = %field.id)
    )]
    pub async fn plan_collection_export(
        &self,
        collection: CollectionHandle,
        request: &RequestList,
        field: &Field,
        destination: &ExportDestination,
        params: &ExportParams,
    ) -> ExportResult<Vec<Vec<ExportTask>>> {
        if !self
            .assembler
            .verify_collection(collection, request.sensor().as_str())
            .await?
        {
            return Err(ExportError::ProvenanceMismatch {
                expected: request.sensor().to_string(),
            });
        }

        let set = self
            .assembler
            .assemble_mosaic_set(collection, request.sensor())
            .await?;

        // Batch band generation: enrich every mosaic before any task is
        // built, so a band-computation failure aborts the whole plan.
        let mut enriched = Vec::with_capacity(set.count());
        for (mosaic, _date) in set.iter() {
            enriched.push(self.attach_required_bands(mosaic, request).await?);
        }

        let mut batches = Vec::with_capacity(set.count());
        for (image, date) in enriched.iter().zip(set.dates()) {
            let tasks = self
                .tasks_for_image(*image, request, field, destination, params, date)
                .await?;
            if tasks.len() != request.products().len() {
                return Err(ExportError::TaskMismatch(format!(
                    "{} products produced {} tasks for {}",
                    request.products().len(),
                    tasks.len(),
                    date.date_string()
                )));
            }
            batches.push(tasks);
        }

        if batches.len() != set.count() {
            return Err(ExportError::TaskMismatch(format!(
                "{} mosaic dates produced {} task batches",
                set.count(),
                batches.len()
            )));
        }

        debug!(dates = batches.len(), "Planned collection export");
        Ok(batches)
    }

    /// Generate every required band from the source image and append
    /// the results as new bands.
    async fn attach_required_bands(
        &self,
        image: ImageHandle,
        request: &RequestList,
    ) -> ExportResult<ImageHandle> {
        let mut generated = Vec::with_capacity(request.required_bands().len());
        for band in request.required_bands() {
            let index = self
                .engine
                .compute_index(image, &ProductId::new(band.as_str()), request.sensor())
                .await?;
            generated.push(index);
        }

        let mut enriched = image;
        for index in generated {
            enriched = self
                .service
                .add_bands(enriched, index)
                .await
                .map_err(|e| ExportError::remote("band computation", e))?;
        }

        Ok(enriched)
    }

    /// Select per-product band subsets and create one unstarted task
    /// for each requested product, in request order.
    async fn tasks_for_image(
        &self,
        image: ImageHandle,
        request: &RequestList,
        field: &Field,
        destination: &ExportDestination,
        params: &ExportParams,
        date: &Timestamp,
    ) -> ExportResult<Vec<ExportTask>> {
        let stem = format!("{}-{}", field.id, request.sensor());
        let label = destination_label(destination);

        let mut params = params.clone();
        if params.region.is_none() {
            params.region = Some(field.geometry.clone());
        }

        let mut tasks = Vec::with_capacity(request.products().len());
        for product in request.products() {
            let bands = request.bands_for(product).ok_or_else(|| {
                ExportError::InvalidRequest {
                    sensor: request.sensor().to_string(),
                    product: product.to_string(),
                }
            })?;

            let subset = self
                .service
                .select_bands(image, bands)
                .await
                .map_err(|e| ExportError::remote("task generation", e))?;

            let file_name_prefix = format!("{}-{}-{}", stem, product, date.date_string());
            let description = format!("{} Image Export Task-{}", label, product);
            let spec = ExportSpec {
                description: description.clone(),
                file_name_prefix: file_name_prefix.clone(),
                destination: destination.clone(),
                params: params.clone(),
            };

            let handle = self
                .service
                .create_export_task(subset, &spec)
                .await
                .map_err(|e| ExportError::remote("task generation", e))?;

            tasks.push(ExportTask {
                product: product.clone(),
                date: *date,
                image: subset,
                file_name_prefix,
                description,
                handle,
            });
        }

        Ok(tasks)
    }
}

fn destination_label(destination: &ExportDestination) -> &'static str {
    match destination {
        ExportDestination::Drive { .. } => "Drive",
        ExportDestination::CloudStorage { .. } => "Cloud",
    }
}
