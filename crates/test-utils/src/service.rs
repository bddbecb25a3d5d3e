//! In-memory compute service backend.
//!
//! Models the remote service's behavior closely enough for
//! orchestration tests: deferred nodes are rows in an in-memory store,
//! and the identity-erasing transforms (mosaic, band algebra) really do
//! drop source properties and acquisition time, so callers that forget
//! the metadata-rebuild step fail the same way they would in
//! production.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use compute_client::{
    CollectionHandle, ComputeError, ComputeResult, ComputeService, ExportSpec, ImageHandle,
    PixelPrecision, PropertyValue, TaskHandle, TaskState,
};
use imagery_common::{BandName, Geometry};

use crate::scenes::DatasetSeed;

#[derive(Debug, Clone)]
struct ImageNode {
    bands: Vec<BandName>,
    properties: HashMap<String, PropertyValue>,
    acquired_ms: Option<i64>,
    footprint: Option<Geometry>,
    precision: Option<PixelPrecision>,
}

#[derive(Debug, Clone)]
struct CollectionNode {
    images: Vec<usize>,
    properties: HashMap<String, PropertyValue>,
}

#[derive(Debug, Clone)]
struct TaskNode {
    state: TaskState,
    spec: ExportSpec,
    #[allow(dead_code)]
    image: usize,
}

#[derive(Default)]
struct Store {
    datasets: HashMap<String, DatasetSeed>,
    images: Vec<ImageNode>,
    collections: Vec<CollectionNode>,
    tasks: HashMap<Uuid, TaskNode>,
    offline: bool,
}

/// In-memory [`ComputeService`] for tests.
#[derive(Default)]
pub struct InMemoryCompute {
    inner: Mutex<Store>,
}

impl InMemoryCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under its collection identifier.
    pub fn seed_dataset(&self, dataset: &str, seed: DatasetSeed) {
        let mut store = self.lock();
        store.datasets.insert(dataset.to_string(), seed);
    }

    /// Make every subsequent call fail with a backend error, to
    /// exercise remote-fault wrapping.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of export tasks created so far.
    pub fn task_count(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Number of tasks that have left the unstarted state.
    pub fn started_task_count(&self) -> usize {
        self.lock()
            .tasks
            .values()
            .filter(|t| t.state != TaskState::Unstarted)
            .count()
    }

    /// The spec a task was created with.
    pub fn task_spec(&self, task: &TaskHandle) -> Option<ExportSpec> {
        self.lock().tasks.get(&task.id).map(|t| t.spec.clone())
    }

    /// Band names of an image, for synchronous assertions.
    pub fn bands_of(&self, image: ImageHandle) -> Vec<BandName> {
        self.lock()
            .images
            .get(image.raw() as usize)
            .map(|node| node.bands.clone())
            .unwrap_or_default()
    }

    /// A property of an image, for synchronous assertions.
    pub fn property_of(&self, image: ImageHandle, key: &str) -> Option<PropertyValue> {
        self.lock()
            .images
            .get(image.raw() as usize)
            .and_then(|node| node.properties.get(key).cloned())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.inner.lock().expect("store lock poisoned")
    }
}

impl Store {
    fn guard(&self) -> ComputeResult<()> {
        if self.offline {
            Err(ComputeError::Backend("service offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn image(&self, handle: ImageHandle) -> ComputeResult<&ImageNode> {
        self.images
            .get(handle.raw() as usize)
            .ok_or_else(|| ComputeError::unknown_image(handle.raw()))
    }

    fn collection(&self, handle: CollectionHandle) -> ComputeResult<&CollectionNode> {
        self.collections
            .get(handle.raw() as usize)
            .ok_or_else(|| ComputeError::unknown_collection(handle.raw()))
    }

    fn push_image(&mut self, node: ImageNode) -> ImageHandle {
        self.images.push(node);
        ImageHandle::from_raw((self.images.len() - 1) as u64)
    }

    fn push_collection(&mut self, node: CollectionNode) -> CollectionHandle {
        self.collections.push(node);
        CollectionHandle::from_raw((self.collections.len() - 1) as u64)
    }

    fn derive_collection(
        &mut self,
        source: CollectionHandle,
        images: Vec<usize>,
    ) -> ComputeResult<CollectionHandle> {
        let properties = self.collection(source)?.properties.clone();
        Ok(self.push_collection(CollectionNode { images, properties }))
    }
}

#[async_trait]
impl ComputeService for InMemoryCompute {
    async fn load_collection(&self, dataset: &str) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let seed = store
            .datasets
            .get(dataset)
            .ok_or_else(|| ComputeError::UnknownDataset(dataset.to_string()))?
            .clone();

        let mut scenes = seed.scenes;
        scenes.sort_by_key(|s| s.acquired);

        let mut images = Vec::with_capacity(scenes.len());
        for scene in scenes {
            let handle = store.push_image(ImageNode {
                bands: scene.bands,
                properties: scene.properties,
                acquired_ms: Some(scene.acquired.epoch_ms()),
                footprint: Some(scene.footprint),
                precision: None,
            });
            images.push(handle.raw() as usize);
        }

        Ok(store.push_collection(CollectionNode {
            images,
            properties: seed.properties,
        }))
    }

    async fn filter_bounds(
        &self,
        collection: CollectionHandle,
        region: &Geometry,
    ) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let candidates = store.collection(collection)?.images.clone();
        let kept: Vec<usize> = candidates
            .into_iter()
            .filter(|&idx| match &store.images[idx].footprint {
                Some(footprint) => footprint.intersects_bounds(region),
                None => true,
            })
            .collect();

        store.derive_collection(collection, kept)
    }

    async fn filter_date_range(
        &self,
        collection: CollectionHandle,
        start_ms: i64,
        end_ms: i64,
    ) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let candidates = store.collection(collection)?.images.clone();
        let kept: Vec<usize> = candidates
            .into_iter()
            .filter(|&idx| match store.images[idx].acquired_ms {
                Some(ms) => ms >= start_ms && ms < end_ms,
                None => false,
            })
            .collect();

        store.derive_collection(collection, kept)
    }

    async fn filter_metadata_lt(
        &self,
        collection: CollectionHandle,
        property: &str,
        threshold: f64,
    ) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let candidates = store.collection(collection)?.images.clone();
        let kept: Vec<usize> = candidates
            .into_iter()
            .filter(|&idx| {
                store.images[idx]
                    .properties
                    .get(property)
                    .and_then(|v| v.as_number())
                    .map(|n| n < threshold)
                    .unwrap_or(false)
            })
            .collect();

        store.derive_collection(collection, kept)
    }

    async fn collection_size(&self, collection: CollectionHandle) -> ComputeResult<usize> {
        let store = self.lock();
        store.guard()?;
        Ok(store.collection(collection)?.images.len())
    }

    async fn image_list(&self, collection: CollectionHandle) -> ComputeResult<Vec<ImageHandle>> {
        let store = self.lock();
        store.guard()?;
        Ok(store
            .collection(collection)?
            .images
            .iter()
            .map(|&idx| ImageHandle::from_raw(idx as u64))
            .collect())
    }

    async fn collection_from_images(
        &self,
        images: &[ImageHandle],
    ) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let mut indices = Vec::with_capacity(images.len());
        for &handle in images {
            store.image(handle)?;
            indices.push(handle.raw() as usize);
        }

        Ok(store.push_collection(CollectionNode {
            images: indices,
            properties: HashMap::new(),
        }))
    }

    async fn collection_property(
        &self,
        collection: CollectionHandle,
        property: &str,
    ) -> ComputeResult<Option<PropertyValue>> {
        let store = self.lock();
        store.guard()?;
        Ok(store.collection(collection)?.properties.get(property).cloned())
    }

    async fn set_collection_properties(
        &self,
        collection: CollectionHandle,
        properties: &HashMap<String, PropertyValue>,
    ) -> ComputeResult<CollectionHandle> {
        let mut store = self.lock();
        store.guard()?;

        let mut node = store.collection(collection)?.clone();
        for (key, value) in properties {
            node.properties.insert(key.clone(), value.clone());
        }
        Ok(store.push_collection(node))
    }

    async fn image_property(
        &self,
        image: ImageHandle,
        property: &str,
    ) -> ComputeResult<Option<PropertyValue>> {
        let store = self.lock();
        store.guard()?;
        Ok(store.image(image)?.properties.get(property).cloned())
    }

    async fn acquisition_time_ms(&self, image: ImageHandle) -> ComputeResult<Option<i64>> {
        let store = self.lock();
        store.guard()?;
        Ok(store.image(image)?.acquired_ms)
    }

    async fn band_names(&self, image: ImageHandle) -> ComputeResult<Vec<BandName>> {
        let store = self.lock();
        store.guard()?;
        Ok(store.image(image)?.bands.clone())
    }

    async fn select_bands(
        &self,
        image: ImageHandle,
        bands: &[BandName],
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?.clone();
        for band in bands {
            if !node.bands.contains(band) {
                return Err(ComputeError::MissingBand(band.to_string()));
            }
        }

        Ok(store.push_image(ImageNode {
            bands: bands.to_vec(),
            ..node
        }))
    }

    async fn add_bands(
        &self,
        image: ImageHandle,
        source: ImageHandle,
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let mut node = store.image(image)?.clone();
        let added = store.image(source)?.bands.clone();
        for band in added {
            if node.bands.contains(&band) {
                return Err(ComputeError::InvalidArgument(format!(
                    "duplicate band {}",
                    band
                )));
            }
            node.bands.push(band);
        }

        Ok(store.push_image(node))
    }

    async fn rename_bands(
        &self,
        image: ImageHandle,
        names: &[BandName],
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?.clone();
        if node.bands.len() != names.len() {
            return Err(ComputeError::InvalidArgument(format!(
                "rename expects {} names, got {}",
                node.bands.len(),
                names.len()
            )));
        }

        Ok(store.push_image(ImageNode {
            bands: names.to_vec(),
            ..node
        }))
    }

    async fn set_image_properties(
        &self,
        image: ImageHandle,
        properties: &HashMap<String, PropertyValue>,
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let mut node = store.image(image)?.clone();
        for (key, value) in properties {
            if key == "system:time_start" {
                if let Some(ms) = value.as_integer() {
                    node.acquired_ms = Some(ms);
                }
            }
            node.properties.insert(key.clone(), value.clone());
        }

        Ok(store.push_image(node))
    }

    async fn cast(
        &self,
        image: ImageHandle,
        precision: PixelPrecision,
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?.clone();
        Ok(store.push_image(ImageNode {
            precision: Some(precision),
            ..node
        }))
    }

    async fn set_footprint(
        &self,
        image: ImageHandle,
        region: &Geometry,
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?.clone();
        Ok(store.push_image(ImageNode {
            footprint: Some(region.clone()),
            ..node
        }))
    }

    async fn mosaic(&self, collection: CollectionHandle) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let indices = store.collection(collection)?.images.clone();
        if indices.is_empty() {
            return Err(ComputeError::InvalidArgument(
                "cannot mosaic an empty collection".to_string(),
            ));
        }

        // Band union in first-seen order. Compositing erases the
        // source images' properties and acquisition time.
        let mut bands: Vec<BandName> = Vec::new();
        for &idx in &indices {
            for band in &store.images[idx].bands {
                if !bands.contains(band) {
                    bands.push(band.clone());
                }
            }
        }

        Ok(store.push_image(ImageNode {
            bands,
            properties: HashMap::new(),
            acquired_ms: None,
            footprint: None,
            precision: None,
        }))
    }

    async fn normalized_difference(
        &self,
        image: ImageHandle,
        first: &BandName,
        second: &BandName,
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?;
        for band in [first, second] {
            if !node.bands.contains(band) {
                return Err(ComputeError::MissingBand(band.to_string()));
            }
        }

        // Band algebra yields a fresh single-band image with no
        // inherited metadata.
        Ok(store.push_image(ImageNode {
            bands: vec![BandName::new("nd")],
            properties: HashMap::new(),
            acquired_ms: None,
            footprint: None,
            precision: None,
        }))
    }

    async fn expression(
        &self,
        image: ImageHandle,
        expr: &str,
        bands: &[(String, BandName)],
        _constants: &[(String, f64)],
    ) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        if expr.trim().is_empty() {
            return Err(ComputeError::InvalidArgument("empty expression".to_string()));
        }

        let node = store.image(image)?;
        for (_, band) in bands {
            if !node.bands.contains(band) {
                return Err(ComputeError::MissingBand(band.to_string()));
            }
        }

        Ok(store.push_image(ImageNode {
            bands: vec![BandName::new("constant")],
            properties: HashMap::new(),
            acquired_ms: None,
            footprint: None,
            precision: None,
        }))
    }

    async fn cube_root(&self, image: ImageHandle) -> ComputeResult<ImageHandle> {
        let mut store = self.lock();
        store.guard()?;

        let node = store.image(image)?.clone();
        Ok(store.push_image(node))
    }

    async fn create_export_task(
        &self,
        image: ImageHandle,
        spec: &ExportSpec,
    ) -> ComputeResult<TaskHandle> {
        let mut store = self.lock();
        store.guard()?;

        store.image(image)?;
        let handle = TaskHandle::new();
        store.tasks.insert(
            handle.id,
            TaskNode {
                state: TaskState::Unstarted,
                spec: spec.clone(),
                image: image.raw() as usize,
            },
        );

        Ok(handle)
    }

    async fn start_task(&self, task: &TaskHandle) -> ComputeResult<()> {
        let mut store = self.lock();
        store.guard()?;

        let node = store
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| ComputeError::InvalidArgument(format!("unknown task {}", task.id)))?;
        if node.state != TaskState::Unstarted {
            return Err(ComputeError::InvalidArgument(format!(
                "task {} already started",
                task.id
            )));
        }
        node.state = TaskState::Running;

        Ok(())
    }

    async fn task_state(&self, task: &TaskHandle) -> ComputeResult<TaskState> {
        let store = self.lock();
        store.guard()?;
        store
            .tasks
            .get(&task.id)
            .map(|t| t.state)
            .ok_or_else(|| ComputeError::InvalidArgument(format!("unknown task {}", task.id)))
    }
}
