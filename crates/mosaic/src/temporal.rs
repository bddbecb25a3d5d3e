//! Acquisition-date extraction and day-level deduplication.

use imagery_common::Timestamp;

/// Acquisition and generation instants of a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateSet {
    pub acquired: Timestamp,
    pub generated: Timestamp,
}

/// Reduce acquisition instants to unique calendar days, ascending.
///
/// When several acquisitions share a day (adjacent tiles over one
/// area of interest), the earliest instant represents that day.
pub fn dedup_daily(mut stamps: Vec<Timestamp>) -> Vec<Timestamp> {
    stamps.sort();
    let mut dates: Vec<Timestamp> = Vec::new();
    for stamp in stamps {
        match dates.last() {
            Some(last) if last.same_day(&stamp) => {}
            _ => dates.push(stamp),
        }
    }
    dates
}
