//! Integration tests for export task planning.

use std::sync::Arc;

use export::ExportPlanner;
use mosaic::CollectionAssembler;
use registry::{ProductRegistry, RequestList};

use compute_client::{
    ComputeService, ExportDestination, ExportParams, ImageHandle, TaskState,
};
use imagery_common::{
    BandName, DateRange, ExportError, Field, Geometry, ProductId, SensorId, Timestamp,
};
use test_utils::scenes::{l2a_scene, s2_sr_dataset_properties};
use test_utils::{DatasetSeed, InMemoryCompute};

fn ts(s: &str) -> Timestamp {
    Timestamp::from_iso8601(s).unwrap()
}

fn field() -> Field {
    Field::new("APX00001", Geometry::rect(77.0, 12.5, 77.3, 12.8))
}

fn product_ids(ids: &[&str]) -> Vec<ProductId> {
    ids.iter().map(|p| ProductId::new(*p)).collect()
}

struct Harness {
    service: Arc<InMemoryCompute>,
    registry: Arc<ProductRegistry>,
    planner: ExportPlanner,
}

impl Harness {
    fn new() -> Self {
        test_utils::init_tracing();
        let service = Arc::new(InMemoryCompute::new());
        service.seed_dataset(
            "COPERNICUS/S2_SR",
            DatasetSeed::new(
                vec![
                    l2a_scene("2021-03-04T10:20:00Z"),
                    l2a_scene("2021-03-04T10:30:00Z"),
                    l2a_scene("2021-03-05T10:20:00Z"),
                ],
                s2_sr_dataset_properties(),
            ),
        );
        let registry = Arc::new(ProductRegistry::builtin().unwrap());
        let planner = ExportPlanner::new(service.clone(), registry.clone()).unwrap();
        Self {
            service,
            registry,
            planner,
        }
    }

    fn request(&self, products: &[&str]) -> RequestList {
        RequestList::new(product_ids(products), SensorId::new("L2A"), &self.registry).unwrap()
    }

    async fn first_image(&self) -> ImageHandle {
        let assembler =
            CollectionAssembler::new(self.service.clone(), self.registry.clone());
        let collection = self
            .service
            .load_collection("COPERNICUS/S2_SR")
            .await
            .unwrap();
        assembler.extract_image(collection, 0).await.unwrap()
    }
}

// ============================================================================
// Single-image planning
// ============================================================================

#[tokio::test]
async fn test_image_export_one_task_per_product() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI", "NDWI", "TC"]);
    let image = harness.first_image().await;
    let date = ts("2021-03-04T10:20:00Z");

    let tasks = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::drive("Field Exports"),
            &ExportParams::default(),
            &date,
        )
        .await
        .unwrap();

    assert_eq!(tasks.len(), 3);

    let prefixes: Vec<&str> = tasks.iter().map(|t| t.file_name_prefix.as_str()).collect();
    assert_eq!(
        prefixes,
        vec![
            "APX00001-L2A-NDVI-2021-03-04",
            "APX00001-L2A-NDWI-2021-03-04",
            "APX00001-L2A-TC-2021-03-04",
        ]
    );
}

#[tokio::test]
async fn test_image_export_band_subsets_per_product() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI", "TC"]);
    let image = harness.first_image().await;

    let tasks = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await
        .unwrap();

    assert_eq!(
        harness.service.bands_of(tasks[0].image),
        vec![BandName::new("NDVI")]
    );
    assert_eq!(
        harness.service.bands_of(tasks[1].image),
        vec![BandName::new("B4"), BandName::new("B3"), BandName::new("B2")]
    );
}

#[tokio::test]
async fn test_image_export_is_side_effect_free() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI", "NDWI", "TC"]);
    let image = harness.first_image().await;

    let tasks = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::cloud_storage("field-exports"),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await
        .unwrap();

    // Every task exists on the queue, none has been started.
    assert_eq!(harness.service.task_count(), 3);
    assert_eq!(harness.service.started_task_count(), 0);
    for task in &tasks {
        assert_eq!(
            harness.service.task_state(&task.handle).await.unwrap(),
            TaskState::Unstarted
        );
    }
}

#[tokio::test]
async fn test_image_export_defaults_region_to_field_geometry() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI"]);
    let image = harness.first_image().await;

    let tasks = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await
        .unwrap();

    let spec = harness.service.task_spec(&tasks[0].handle).unwrap();
    assert_eq!(spec.params.region, Some(field().geometry));
    assert_eq!(spec.params.scale_m, 10);
}

#[tokio::test]
async fn test_image_export_rejects_foreign_image() {
    let harness = Harness::new();
    // The seeded image is L2A; an L8SR request must be refused before
    // any task is created.
    let request = RequestList::new(
        product_ids(&["NDVI"]),
        SensorId::new("L8SR"),
        &harness.registry,
    )
    .unwrap();
    let image = harness.first_image().await;

    let result = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await;

    assert!(matches!(result, Err(ExportError::ProvenanceMismatch { .. })));
    assert_eq!(harness.service.task_count(), 0);
}

#[tokio::test]
async fn test_failed_plan_starts_nothing() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI"]);
    let image = harness.first_image().await;

    harness.service.set_offline(true);
    let result = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await;

    assert!(matches!(result, Err(ExportError::RemoteService { .. })));
    assert_eq!(harness.service.started_task_count(), 0);
}

// ============================================================================
// Collection planning
// ============================================================================

#[tokio::test]
async fn test_collection_export_nested_counts() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI", "NDWI", "TC"]);

    let assembler = CollectionAssembler::new(harness.service.clone(), harness.registry.clone());
    let collection = assembler
        .assemble_collection(
            &SensorId::new("L2A"),
            &field().geometry,
            &DateRange::new(ts("2021-03-01"), ts("2021-03-10")).unwrap(),
            None,
        )
        .await
        .unwrap();

    let batches = harness
        .planner
        .plan_collection_export(
            collection,
            &request,
            &field(),
            &ExportDestination::drive("Field Exports"),
            &ExportParams::default(),
        )
        .await
        .unwrap();

    // Three scenes over two unique days: outer list per date, inner
    // list per product.
    assert_eq!(batches.len(), 2);
    for batch in &batches {
        assert_eq!(batch.len(), request.products().len());
    }

    assert_eq!(
        batches[0][0].file_name_prefix,
        "APX00001-L2A-NDVI-2021-03-04"
    );
    assert_eq!(
        batches[1][2].file_name_prefix,
        "APX00001-L2A-TC-2021-03-05"
    );

    // Dates pair 1:1 with batches, ascending.
    assert!(batches[0].iter().all(|t| t.date.date_string() == "2021-03-04"));
    assert!(batches[1].iter().all(|t| t.date.date_string() == "2021-03-05"));

    // Still nothing started.
    assert_eq!(harness.service.started_task_count(), 0);
}

#[tokio::test]
async fn test_collection_export_rejects_foreign_collection() {
    let harness = Harness::new();
    let request = RequestList::new(
        product_ids(&["NDVI"]),
        SensorId::new("L8SR"),
        &harness.registry,
    )
    .unwrap();

    let collection = harness
        .service
        .load_collection("COPERNICUS/S2_SR")
        .await
        .unwrap();

    let result = harness
        .planner
        .plan_collection_export(
            collection,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
        )
        .await;

    assert!(matches!(result, Err(ExportError::ProvenanceMismatch { .. })));
    assert_eq!(harness.service.task_count(), 0);
}

#[tokio::test]
async fn test_caller_starts_tasks_explicitly() {
    let harness = Harness::new();
    let request = harness.request(&["NDVI"]);
    let image = harness.first_image().await;

    let tasks = harness
        .planner
        .plan_image_export(
            image,
            &request,
            &field(),
            &ExportDestination::default(),
            &ExportParams::default(),
            &ts("2021-03-04"),
        )
        .await
        .unwrap();

    for task in &tasks {
        harness.service.start_task(&task.handle).await.unwrap();
    }
    assert_eq!(harness.service.started_task_count(), tasks.len());
}
