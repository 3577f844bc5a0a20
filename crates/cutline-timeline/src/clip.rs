//! Clip types for the timeline.

use cutline_core::{CutlineError, Result, TimeRange};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one parallel lane of the timeline.
pub type TrackId = u32;

/// A placement of a source clip (or part of it) on the timeline.
///
/// `trim_start`/`trim_end` are positions on the source clip's own timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineClip {
    /// Unique clip ID
    pub id: Uuid,
    /// Source clip in the library (lookup only)
    pub source_clip_id: Uuid,
    /// Lane this clip sits on
    pub track_id: TrackId,
    /// Position on the timeline, in seconds
    pub start_time: f64,
    /// Length occupied on the timeline, in seconds
    pub duration: f64,
    /// Source in point
    pub trim_start: f64,
    /// Source out point
    pub trim_end: f64,
}

impl TimelineClip {
    /// Create a new clip playing the first `duration` seconds of its source.
    pub fn new(source_clip_id: Uuid, track_id: TrackId, start_time: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_clip_id,
            track_id,
            start_time,
            duration,
            trim_start: 0.0,
            trim_end: duration,
        }
    }

    /// Timeline end (exclusive).
    #[inline]
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Get the timeline range this clip occupies.
    #[inline]
    pub fn timeline_range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.duration)
    }

    /// Get the source range this clip plays.
    #[inline]
    pub fn source_range(&self) -> TimeRange {
        TimeRange::from_start_end(self.trim_start, self.trim_end)
    }

    /// Check the record-level invariants: `start_time >= 0`, `duration > 0`,
    /// all fields finite.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            self.start_time,
            self.duration,
            self.trim_start,
            self.trim_end,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(CutlineError::invalid_range(format!(
                "clip {} has a non-finite time field",
                self.id
            )));
        }
        if self.start_time < 0.0 {
            return Err(CutlineError::invalid_range(format!(
                "start time {} is before the timeline origin",
                self.start_time
            )));
        }
        if self.duration <= 0.0 {
            return Err(CutlineError::invalid_range(format!(
                "duration {} must be positive",
                self.duration
            )));
        }
        Ok(())
    }
}

/// A partial update to a [`TimelineClip`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipPatch {
    pub track_id: Option<TrackId>,
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub trim_start: Option<f64>,
    pub trim_end: Option<f64>,
}

impl ClipPatch {
    /// An empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(mut self, track_id: TrackId) -> Self {
        self.track_id = Some(track_id);
        self
    }

    pub fn start(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set both source trim points.
    pub fn trim(mut self, trim_start: f64, trim_end: f64) -> Self {
        self.trim_start = Some(trim_start);
        self.trim_end = Some(trim_end);
        self
    }

    /// True if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce the patched copy of `clip`. The original is not touched.
    pub fn applied_to(&self, clip: &TimelineClip) -> TimelineClip {
        TimelineClip {
            id: clip.id,
            source_clip_id: clip.source_clip_id,
            track_id: self.track_id.unwrap_or(clip.track_id),
            start_time: self.start_time.unwrap_or(clip.start_time),
            duration: self.duration.unwrap_or(clip.duration),
            trim_start: self.trim_start.unwrap_or(clip.trim_start),
            trim_end: self.trim_end.unwrap_or(clip.trim_end),
        }
    }
}
