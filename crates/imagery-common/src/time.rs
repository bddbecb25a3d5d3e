//! Timestamp handling for acquisition dates and export filenames.
//!
//! All instants are normalized to UTC at construction; calendar
//! bucketing (mosaic deduplication, filename dates) is therefore
//! always evaluated against the UTC day.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, ExportResult};

/// A single point in time with day-granularity helpers.
///
/// Wraps a UTC instant truncated to millisecond precision, so equality
/// and ordering coincide with comparison of the full ISO string form.
/// Immutable: arithmetic returns new values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    inner: DateTime<Utc>,
}

/// Units accepted by [`Timestamp::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Timestamp {
    /// Wrap a chrono instant, truncating to millisecond precision.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let ms = dt.timestamp_millis();
        let inner = Utc.timestamp_millis_opt(ms).single().unwrap_or(dt);
        Self { inner }
    }

    /// Construct from milliseconds since the Unix epoch.
    pub fn from_epoch_ms(ms: i64) -> ExportResult<Self> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .map(|inner| Self { inner })
            .ok_or_else(|| ExportError::InvalidTimestamp(format!("epoch ms out of range: {}", ms)))
    }

    /// Parse an ISO 8601 string.
    ///
    /// Accepts a full RFC 3339 datetime, a naive datetime (assumed UTC,
    /// with or without fractional seconds) or a bare date.
    pub fn from_iso8601(s: &str) -> ExportResult<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }

        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::from_datetime(Utc.from_utc_datetime(&ndt)));
        }

        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(Self::from_datetime(Utc.from_utc_datetime(&ndt)));
        }

        if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
                return Ok(Self::from_datetime(Utc.from_utc_datetime(&ndt)));
            }
        }

        Err(ExportError::InvalidTimestamp(s.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    pub fn month(&self) -> u32 {
        self.inner.month()
    }

    pub fn day(&self) -> u32 {
        self.inner.day()
    }

    pub fn hour(&self) -> u32 {
        self.inner.hour()
    }

    pub fn minute(&self) -> u32 {
        self.inner.minute()
    }

    pub fn second(&self) -> u32 {
        self.inner.second()
    }

    /// Compact date form used in export filenames: "YYYY-MM-DD".
    pub fn date_string(&self) -> String {
        self.inner.format("%Y-%m-%d").to_string()
    }

    /// Full ISO 8601 form with millisecond precision, UTC.
    pub fn iso_string(&self) -> String {
        self.inner.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// Milliseconds since the Unix epoch.
    pub fn epoch_ms(&self) -> i64 {
        self.inner.timestamp_millis()
    }

    /// The UTC calendar day, used as the mosaic deduplication key.
    pub fn day_key(&self) -> NaiveDate {
        self.inner.date_naive()
    }

    /// True if both instants fall on the same UTC calendar day.
    pub fn same_day(&self, other: &Timestamp) -> bool {
        self.day_key() == other.day_key()
    }

    /// Midnight UTC of this instant's calendar day.
    pub fn day_start(&self) -> Timestamp {
        let midnight = self
            .day_key()
            .and_hms_opt(0, 0, 0)
            .unwrap_or(self.inner.naive_utc());
        Timestamp::from_datetime(Utc.from_utc_datetime(&midnight))
    }

    /// Return a new Timestamp advanced by `delta` units.
    pub fn advance(&self, delta: i64, unit: DateUnit) -> Timestamp {
        let inner = match unit {
            DateUnit::Years => add_months(self.inner, delta.saturating_mul(12)),
            DateUnit::Months => add_months(self.inner, delta),
            DateUnit::Weeks => self.inner + Duration::weeks(delta),
            DateUnit::Days => self.inner + Duration::days(delta),
            DateUnit::Hours => self.inner + Duration::hours(delta),
            DateUnit::Minutes => self.inner + Duration::minutes(delta),
            DateUnit::Seconds => self.inner + Duration::seconds(delta),
        };
        Timestamp::from_datetime(inner)
    }

    /// Return a new Timestamp advanced by exactly one day.
    ///
    /// This is the exclusive-end generator for date-range filters:
    /// an inclusive `[start, end]` request becomes
    /// `[start, end.next_day())` on the wire.
    pub fn next_day(&self) -> Timestamp {
        self.advance(1, DateUnit::Days)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso_string())
    }
}

fn add_months(dt: DateTime<Utc>, months: i64) -> DateTime<Utc> {
    let result = if months >= 0 {
        dt.checked_add_months(Months::new(months as u32))
    } else {
        dt.checked_sub_months(Months::new(months.unsigned_abs() as u32))
    };
    result.unwrap_or(dt)
}

/// A caller-facing date range, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl DateRange {
    pub fn new(start: Timestamp, end: Timestamp) -> ExportResult<Self> {
        if end < start {
            return Err(ExportError::InvalidTimestamp(format!(
                "date range end {} precedes start {}",
                end.iso_string(),
                start.iso_string()
            )));
        }
        Ok(Self { start, end })
    }

    /// The exclusive filter end: one day past the inclusive end.
    pub fn exclusive_end(&self) -> Timestamp {
        self.end.next_day()
    }
}
