//! The remote compute service trait.

use std::collections::HashMap;

use async_trait::async_trait;

use imagery_common::{BandName, Geometry};

use crate::error::ComputeResult;
use crate::export_spec::{ExportSpec, TaskHandle, TaskState};
use crate::handles::{CollectionHandle, ImageHandle};
use crate::property::{PixelPrecision, PropertyValue};

/// Interface to the remote image-processing backend.
///
/// All operations are deferred server-side; a call returning a handle
/// extends the evaluation graph, a call returning a value materializes
/// one. Implementations must be safe for concurrent use.
///
/// Compositing ([`mosaic`](Self::mosaic)) and band algebra
/// ([`normalized_difference`](Self::normalized_difference),
/// [`expression`](Self::expression)) erase the source image's
/// properties and acquisition time; callers are responsible for
/// rebuilding metadata afterwards.
#[async_trait]
pub trait ComputeService: Send + Sync {
    // === Collections ===

    /// Load a sensor's dataset by its collection identifier.
    async fn load_collection(&self, dataset: &str) -> ComputeResult<CollectionHandle>;

    /// Keep only images whose footprint intersects `region`.
    async fn filter_bounds(
        &self,
        collection: CollectionHandle,
        region: &Geometry,
    ) -> ComputeResult<CollectionHandle>;

    /// Keep only images acquired within `[start_ms, end_ms)`.
    async fn filter_date_range(
        &self,
        collection: CollectionHandle,
        start_ms: i64,
        end_ms: i64,
    ) -> ComputeResult<CollectionHandle>;

    /// Keep only images whose numeric `property` is strictly less than
    /// `threshold`.
    async fn filter_metadata_lt(
        &self,
        collection: CollectionHandle,
        property: &str,
        threshold: f64,
    ) -> ComputeResult<CollectionHandle>;

    async fn collection_size(&self, collection: CollectionHandle) -> ComputeResult<usize>;

    /// Materialize the collection's images in acquisition order.
    async fn image_list(&self, collection: CollectionHandle) -> ComputeResult<Vec<ImageHandle>>;

    /// Build a new collection from explicit images.
    async fn collection_from_images(
        &self,
        images: &[ImageHandle],
    ) -> ComputeResult<CollectionHandle>;

    async fn collection_property(
        &self,
        collection: CollectionHandle,
        property: &str,
    ) -> ComputeResult<Option<PropertyValue>>;

    async fn set_collection_properties(
        &self,
        collection: CollectionHandle,
        properties: &HashMap<String, PropertyValue>,
    ) -> ComputeResult<CollectionHandle>;

    // === Images ===

    async fn image_property(
        &self,
        image: ImageHandle,
        property: &str,
    ) -> ComputeResult<Option<PropertyValue>>;

    /// Acquisition instant in epoch milliseconds; `None` after an
    /// identity-erasing transform until metadata is rebuilt.
    async fn acquisition_time_ms(&self, image: ImageHandle) -> ComputeResult<Option<i64>>;

    async fn band_names(&self, image: ImageHandle) -> ComputeResult<Vec<BandName>>;

    /// Subset an image to the named bands, in the given order.
    async fn select_bands(
        &self,
        image: ImageHandle,
        bands: &[BandName],
    ) -> ComputeResult<ImageHandle>;

    /// Append every band of `source` to `image`.
    async fn add_bands(
        &self,
        image: ImageHandle,
        source: ImageHandle,
    ) -> ComputeResult<ImageHandle>;

    /// Rename all bands; `names` must match the band count.
    async fn rename_bands(
        &self,
        image: ImageHandle,
        names: &[BandName],
    ) -> ComputeResult<ImageHandle>;

    /// Merge properties into the image's metadata. A
    /// `system:time_start` integer entry also restores the acquisition
    /// instant.
    async fn set_image_properties(
        &self,
        image: ImageHandle,
        properties: &HashMap<String, PropertyValue>,
    ) -> ComputeResult<ImageHandle>;

    async fn cast(
        &self,
        image: ImageHandle,
        precision: PixelPrecision,
    ) -> ComputeResult<ImageHandle>;

    /// Restore an image footprint erased by compositing.
    async fn set_footprint(
        &self,
        image: ImageHandle,
        region: &Geometry,
    ) -> ComputeResult<ImageHandle>;

    // === Compositing & band algebra ===

    /// Composite a collection, top-most valid pixel winning. Erases
    /// source properties.
    async fn mosaic(&self, collection: CollectionHandle) -> ComputeResult<ImageHandle>;

    /// `(first - second) / (first + second)` as a single-band image.
    async fn normalized_difference(
        &self,
        image: ImageHandle,
        first: &BandName,
        second: &BandName,
    ) -> ComputeResult<ImageHandle>;

    /// Evaluate an arithmetic expression over named band and constant
    /// bindings, yielding a single-band image.
    async fn expression(
        &self,
        image: ImageHandle,
        expr: &str,
        bands: &[(String, BandName)],
        constants: &[(String, f64)],
    ) -> ComputeResult<ImageHandle>;

    /// Per-pixel cube root.
    async fn cube_root(&self, image: ImageHandle) -> ComputeResult<ImageHandle>;

    // === Batch export queue ===

    /// Create an unstarted export task for `image`.
    async fn create_export_task(
        &self,
        image: ImageHandle,
        spec: &ExportSpec,
    ) -> ComputeResult<TaskHandle>;

    /// Enqueue the task for asynchronous server-side execution.
    async fn start_task(&self, task: &TaskHandle) -> ComputeResult<()>;

    async fn task_state(&self, task: &TaskHandle) -> ComputeResult<TaskState>;
}
