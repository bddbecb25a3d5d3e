//! The mosaic set: one image per unique acquisition day.

use compute_client::{CollectionHandle, ImageHandle};
use imagery_common::{ExportError, ExportResult, Timestamp};

/// One mosaic image per unique acquisition day of a filtered
/// collection, paired 1:1 with its dates.
///
/// Invariants, enforced at construction: `images` and `dates` have the
/// same length, and `dates` is strictly ascending with no two entries
/// on the same calendar day. This is the central deduplication
/// contract of the export pipeline.
#[derive(Debug, Clone)]
pub struct MosaicSet {
    collection: CollectionHandle,
    images: Vec<ImageHandle>,
    dates: Vec<Timestamp>,
}

impl MosaicSet {
    pub fn new(
        collection: CollectionHandle,
        images: Vec<ImageHandle>,
        dates: Vec<Timestamp>,
    ) -> ExportResult<Self> {
        if images.len() != dates.len() {
            return Err(ExportError::TaskMismatch(format!(
                "mosaic set pairs {} images with {} dates",
                images.len(),
                dates.len()
            )));
        }
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] || pair[0].same_day(&pair[1]) {
                return Err(ExportError::TaskMismatch(format!(
                    "mosaic set dates not strictly ascending by day: {} then {}",
                    pair[0].iso_string(),
                    pair[1].iso_string()
                )));
            }
        }
        Ok(Self {
            collection,
            images,
            dates,
        })
    }

    /// The mosaic images as a tagged collection on the remote service.
    pub fn collection(&self) -> CollectionHandle {
        self.collection
    }

    pub fn images(&self) -> &[ImageHandle] {
        &self.images
    }

    pub fn dates(&self) -> &[Timestamp] {
        &self.dates
    }

    pub fn count(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Iterate `(image, date)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (ImageHandle, &Timestamp)> {
        self.images.iter().copied().zip(self.dates.iter())
    }
}
