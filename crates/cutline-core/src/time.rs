//! Time representation for the timeline axis
//!
//! Positions and durations are seconds as `f64`. Comparisons that must be
//! robust to accumulated floating-point error go through [`nearly_equal`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when two time positions are considered the same point.
pub const TIME_EPSILON: f64 = 1e-9;

/// Check whether two time positions are the same within [`TIME_EPSILON`].
#[inline]
pub fn nearly_equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= TIME_EPSILON
}

/// Format seconds as `m:ss` for rulers and the playhead readout.
///
/// Negative and non-finite inputs format as `0:00`.
pub fn format_timecode(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// A time range with inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// Duration of the range in seconds
    pub duration: f64,
}

impl TimeRange {
    /// Create a new time range from start and duration.
    #[inline]
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// Create a time range from start and end times.
    #[inline]
    pub fn from_start_end(start: f64, end: f64) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    /// Check if a time is within `[start, end)`.
    #[inline]
    pub fn contains(self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Check if a time is within `[start, end]`, edges included.
    #[inline]
    pub fn contains_inclusive(self, time: f64) -> bool {
        time >= self.start && time <= self.end()
    }

    /// Check if a time lies strictly between start and end.
    #[inline]
    pub fn contains_strictly(self, time: f64) -> bool {
        time > self.start && time < self.end()
    }

    /// Check if two ranges overlap. Ranges that merely touch do not.
    pub fn overlaps(self, other: Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start: 0.0,
        duration: 0.0,
    };
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end())
    }
}
