//! Fixed-length window partitioning of a date range
//!
//! The partitioner is a pure function of its inputs: the same range and
//! window length always produce the identical window sequence. Windows are
//! 0-indexed, contiguous, and half-open; the last window's nominal end may
//! extend past the range end, in which case queries are clamped to the
//! range by the caller (see [`crate::compositor::composite_range`]).

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::earthdata::error::{EarthdataError, Result};

/// Inclusive start / exclusive end pair of calendar dates.
///
/// Invariant: `start <= end`. Constructed via [`TimeRange::new`], which
/// enforces it; deserialized ranges are re-validated by [`partition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EarthdataError::InvalidRange(format!(
                "start {} lies after end {}",
                start, end
            )));
        }
        Ok(TimeRange { start, end })
    }

    /// Total number of days covered, end exclusive.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// One fixed-length composite window: `[start, end)` with
/// `end = start + length_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub index: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// True when `date` falls inside the half-open window interval.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    /// Display label: ISO start date, " to ", ISO date of the last day
    /// covered (end minus one day). Consumers use this both as a display
    /// string and a sort key, so the format is exact.
    pub fn label(&self) -> String {
        let last_day = self.end - Days::new(1);
        format!(
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            last_day.format("%Y-%m-%d")
        )
    }

    /// Window start as epoch milliseconds at UTC midnight. Composites are
    /// stamped with this, mirroring the source images' acquisition stamps.
    pub fn start_millis(&self) -> i64 {
        self.start
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis()
    }
}

/// Partition `range` into consecutive windows of `length_days` days.
///
/// The window count is `ceil(total_days / length_days)`. A zero-length
/// range (`start == end`) still yields one window of nominal length, so
/// downstream consumers always see at least one window per valid range.
///
/// Fails with `InvalidWindow` when `length_days == 0` and `InvalidRange`
/// when `range.start > range.end`, both before any remote interaction.
pub fn partition(range: &TimeRange, length_days: u32) -> Result<Vec<Window>> {
    if length_days == 0 {
        return Err(EarthdataError::InvalidWindow(
            "window length must be a positive number of days".to_string(),
        ));
    }
    // Re-validate: ranges can arrive through deserialization.
    let range = TimeRange::new(range.start, range.end)?;

    let total_days = range.num_days();
    let length = i64::from(length_days);
    let count = if total_days == 0 {
        1
    } else {
        (total_days + length - 1) / length
    };

    let mut windows = Vec::with_capacity(count as usize);
    for index in 0..count as usize {
        let start = range.start + Days::new(index as u64 * u64::from(length_days));
        let end = start + Days::new(u64::from(length_days));
        windows.push(Window { index, start, end });
    }
    Ok(windows)
}
