//! Batch-export task descriptors and handles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use imagery_common::Geometry;

/// Where an exported raster is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportDestination {
    /// A folder in the authenticated account's personal drive.
    Drive { folder: String },
    /// A cloud object-storage bucket.
    CloudStorage { bucket: String },
}

impl ExportDestination {
    pub fn drive(folder: impl Into<String>) -> Self {
        ExportDestination::Drive {
            folder: folder.into(),
        }
    }

    pub fn cloud_storage(bucket: impl Into<String>) -> Self {
        ExportDestination::CloudStorage {
            bucket: bucket.into(),
        }
    }
}

impl Default for ExportDestination {
    fn default() -> Self {
        ExportDestination::Drive {
            folder: "Unassigned Exports".to_string(),
        }
    }
}

/// Output file format for exported rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    GeoTiff,
    TfRecord,
}

/// Raster export parameters shared by every task in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportParams {
    /// Export region; defaults to the field geometry when absent.
    pub region: Option<Geometry>,
    /// Resolution in meters per pixel.
    pub scale_m: u32,
    /// Coordinate reference system of the exported projection.
    pub crs: String,
    /// Maximum allowed pixel count; the remote task fails above this.
    pub max_pixels: u64,
    /// Skip writing fully-masked tiles.
    pub skip_empty_tiles: bool,
    pub file_format: FileFormat,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            region: None,
            scale_m: 10,
            crs: "EPSG:4326".to_string(),
            max_pixels: 100_000_000,
            skip_empty_tiles: true,
            file_format: FileFormat::GeoTiff,
        }
    }
}

/// A fully-resolved export request handed to the task factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpec {
    pub description: String,
    /// Filename prefix: `{fieldID}-{sensor}-{product}-{YYYY-MM-DD}`.
    pub file_name_prefix: String,
    pub destination: ExportDestination,
    pub params: ExportParams,
}

/// Handle to a batch-export task on the remote queue.
///
/// Tasks are created unstarted; starting them is the only operation in
/// the system with external side effects and is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: Uuid,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of a batch-export task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Unstarted,
    Running,
    Completed,
    Failed,
    Cancelled,
}
