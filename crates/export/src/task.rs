//! The export task record.

use compute_client::{ImageHandle, TaskHandle};
use imagery_common::{ProductId, Timestamp};

/// One unit of batch-export work: a product image bound for a
/// destination, with its unstarted remote task handle.
///
/// The filename prefix is `{fieldID}-{sensor}-{product}-{YYYY-MM-DD}`;
/// task lists preserve a 1:1:1 correspondence among products, dates and
/// generated images.
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub product: ProductId,
    /// Acquisition date of the exported image.
    pub date: Timestamp,
    /// The product's band subset, as an independent image.
    pub image: ImageHandle,
    pub file_name_prefix: String,
    pub description: String,
    /// Unstarted remote task; starting it is the caller's explicit act.
    pub handle: TaskHandle,
}
