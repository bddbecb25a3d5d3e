//! Integration tests for collection assembly and mosaic deduplication.

use std::sync::Arc;

use mosaic::CollectionAssembler;
use registry::ProductRegistry;

use compute_client::ComputeService;
use imagery_common::{DateRange, ExportError, Geometry, SatelliteId, SensorId, Timestamp};
use test_utils::scenes::{l2a_scene, s2_sr_dataset_properties};
use test_utils::{DatasetSeed, InMemoryCompute};

fn ts(s: &str) -> Timestamp {
    Timestamp::from_iso8601(s).unwrap()
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(ts(start), ts(end)).unwrap()
}

/// Two same-day acquisitions plus one next-day acquisition.
fn seeded_service() -> Arc<InMemoryCompute> {
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
    service
}

fn assembler(service: Arc<InMemoryCompute>) -> CollectionAssembler {
    let registry = Arc::new(ProductRegistry::builtin().unwrap());
    CollectionAssembler::new(service, registry)
}

fn l2a() -> SensorId {
    SensorId::new("L2A")
}

fn roi() -> Geometry {
    Geometry::rect(77.0, 12.5, 77.3, 12.8)
}

// ============================================================================
// Collection assembly
// ============================================================================

#[tokio::test]
async fn test_assemble_collection_filters_spatially_and_temporally() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = assembler
        .assemble_collection(&l2a(), &roi(), &range("2021-03-01", "2021-03-10"), None)
        .await
        .unwrap();
    assert_eq!(service.collection_size(collection).await.unwrap(), 3);

    // A disjoint region excludes everything.
    let far_away = Geometry::rect(10.0, 50.0, 11.0, 51.0);
    let empty = assembler
        .assemble_collection(&l2a(), &far_away, &range("2021-03-01", "2021-03-10"), None)
        .await
        .unwrap();
    assert_eq!(service.collection_size(empty).await.unwrap(), 0);
}

#[tokio::test]
async fn test_assemble_collection_end_date_is_inclusive() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    // Range ends on 2021-03-05; the scene acquired that day at 10:20
    // must still be included.
    let collection = assembler
        .assemble_collection(&l2a(), &roi(), &range("2021-03-05", "2021-03-05"), None)
        .await
        .unwrap();
    assert_eq!(service.collection_size(collection).await.unwrap(), 1);
}

#[tokio::test]
async fn test_assemble_collection_cloud_filter_strictly_less_than() {
    let service = Arc::new(InMemoryCompute::new());
    service.seed_dataset(
        "COPERNICUS/S2_SR",
        DatasetSeed::new(
            vec![
                l2a_scene("2021-03-04T10:20:00Z").with_cloud_cover("CLOUDY_PIXEL_PERCENTAGE", 3.0),
                l2a_scene("2021-03-05T10:20:00Z").with_cloud_cover("CLOUDY_PIXEL_PERCENTAGE", 40.0),
                l2a_scene("2021-03-06T10:20:00Z").with_cloud_cover("CLOUDY_PIXEL_PERCENTAGE", 80.0),
            ],
            s2_sr_dataset_properties(),
        ),
    );
    let assembler = assembler(service.clone());

    let collection = assembler
        .assemble_collection(
            &l2a(),
            &roi(),
            &range("2021-03-01", "2021-03-10"),
            Some(40.0),
        )
        .await
        .unwrap();
    // 40.0 is not strictly below the threshold.
    assert_eq!(service.collection_size(collection).await.unwrap(), 1);
}

#[tokio::test]
async fn test_assemble_collection_unknown_sensor() {
    let service = seeded_service();
    let assembler = assembler(service);

    let result = assembler
        .assemble_collection(
            &SensorId::new("NOPE"),
            &roi(),
            &range("2021-03-01", "2021-03-10"),
            None,
        )
        .await;
    assert!(matches!(result, Err(ExportError::InvalidSensor(_))));
}

#[tokio::test]
async fn test_remote_fault_wrapped_with_stage() {
    let service = seeded_service();
    let assembler = assembler(service.clone());
    service.set_offline(true);

    let result = assembler
        .assemble_collection(&l2a(), &roi(), &range("2021-03-01", "2021-03-10"), None)
        .await;
    match result {
        Err(ExportError::RemoteService { stage, .. }) => assert_eq!(stage, "filtering"),
        other => panic!("expected RemoteService, got {:?}", other.map(|_| ())),
    }
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_verify_image_by_sensor_and_satellite() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let image = assembler.extract_image(collection, 0).await.unwrap();

    assert!(assembler.verify_image(image, "L2A").await.unwrap());
    assert!(assembler.verify_image(image, "S2").await.unwrap());
    // A Sentinel image is not a Landsat acquisition.
    assert!(!assembler.verify_image(image, "L8SR").await.unwrap());
}

#[tokio::test]
async fn test_verify_image_invalid_mode() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let image = assembler.extract_image(collection, 0).await.unwrap();

    let result = assembler.verify_image(image, "MODIS").await;
    assert!(matches!(result, Err(ExportError::InvalidMode(_))));
}

#[tokio::test]
async fn test_verify_collection_by_tags() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    assert!(assembler.verify_collection(collection, "L2A").await.unwrap());
    assert!(assembler.verify_collection(collection, "S2").await.unwrap());
    assert!(!assembler.verify_collection(collection, "L8SR").await.unwrap());
}

// ============================================================================
// Extraction
// ============================================================================

#[tokio::test]
async fn test_extract_image_negative_index_is_latest() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let latest = assembler.extract_image(collection, -1).await.unwrap();

    let acquired = service.acquisition_time_ms(latest).await.unwrap().unwrap();
    assert_eq!(
        Timestamp::from_epoch_ms(acquired).unwrap().date_string(),
        "2021-03-05"
    );
}

#[tokio::test]
async fn test_extract_image_out_of_range() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let result = assembler.extract_image(collection, 7).await;
    assert!(matches!(result, Err(ExportError::EmptyResult(_))));
}

#[tokio::test]
async fn test_extract_images_for_date_returns_all_same_day() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let images = assembler
        .extract_images_for_date(collection, &ts("2021-03-04T23:00:00Z"))
        .await
        .unwrap();
    // Whole calendar day, regardless of the query instant's clock time.
    assert_eq!(images.len(), 2);
}

#[tokio::test]
async fn test_extract_images_for_absent_date() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let result = assembler
        .extract_images_for_date(collection, &ts("2021-04-01"))
        .await;
    match result {
        Err(ExportError::EmptyResult(message)) => assert!(message.contains("2021-04-01")),
        other => panic!("expected EmptyResult, got {:?}", other.map(|i| i.len())),
    }
}

// ============================================================================
// Mosaicking
// ============================================================================

#[tokio::test]
async fn test_mosaic_for_date_rebuilds_metadata() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let date = ts("2021-03-04T10:20:00Z");
    let composite = assembler
        .mosaic_for_date(collection, &l2a(), &date)
        .await
        .unwrap();

    // Compositing erased identity; the rebuild step restored it.
    assert_eq!(
        service.acquisition_time_ms(composite).await.unwrap(),
        Some(date.epoch_ms())
    );
    assert_eq!(
        service
            .property_of(composite, "PRODUCT_ID")
            .and_then(|v| v.as_text().map(|s| s.to_string())),
        Some("S2X_MSIL2A".to_string())
    );
    assert!(assembler.verify_image(composite, "L2A").await.unwrap());
}

#[tokio::test]
async fn test_mosaic_set_deduplicates_days() {
    // Two images on 2021-03-04 and one on 2021-03-05 yield a set of
    // exactly two mosaics with ascending unique dates.
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let set = assembler
        .assemble_mosaic_set(collection, &l2a())
        .await
        .unwrap();

    assert_eq!(set.count(), 2);
    assert_eq!(set.images().len(), set.dates().len());
    let days: Vec<String> = set.dates().iter().map(|d| d.date_string()).collect();
    assert_eq!(days, vec!["2021-03-04", "2021-03-05"]);

    // Dedup favors the earliest acquisition of the day.
    assert_eq!(set.dates()[0], ts("2021-03-04T10:20:00Z"));

    // The tagged mosaic collection verifies like a sensor collection.
    assert!(assembler
        .verify_collection(set.collection(), "L2A")
        .await
        .unwrap());
}

// ============================================================================
// Date sets
// ============================================================================

#[tokio::test]
async fn test_date_set_reads_generation_time() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let image = assembler.extract_image(collection, 0).await.unwrap();

    let dates = assembler
        .date_set(image, &SatelliteId::new("S2"))
        .await
        .unwrap();
    assert_eq!(dates.acquired, ts("2021-03-04T10:20:00Z"));
    assert_eq!(dates.generated, ts("2021-03-04T12:20:00Z"));
}

#[tokio::test]
async fn test_date_set_unknown_satellite() {
    let service = seeded_service();
    let assembler = assembler(service.clone());

    let collection = service.load_collection("COPERNICUS/S2_SR").await.unwrap();
    let image = assembler.extract_image(collection, 0).await.unwrap();

    let result = assembler.date_set(image, &SatelliteId::new("GK2")).await;
    assert!(matches!(result, Err(ExportError::InvalidSatellite(_))));
}
