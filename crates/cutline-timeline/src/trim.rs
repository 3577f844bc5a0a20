//! Trimming a placed clip's source in/out range.
//!
//! In/out points are always positions on the source clip's own timeline.
//! Marks taken on the timeline (e.g. from the playhead) go through
//! [`TrimPoints::from_timeline`] first.

use cutline_core::{CutlineError, Result};
use uuid::Uuid;

use crate::clip::{ClipPatch, TimelineClip};
use crate::model::TimelineModel;

/// A source-relative in/out pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimPoints {
    pub in_point: f64,
    pub out_point: f64,
}

impl TrimPoints {
    pub fn new(in_point: f64, out_point: f64) -> Self {
        Self {
            in_point,
            out_point,
        }
    }

    /// Convert in/out marks taken in timeline time into source positions
    /// for `clip`.
    pub fn from_timeline(clip: &TimelineClip, in_time: f64, out_time: f64) -> Self {
        Self {
            in_point: clip.trim_start + (in_time - clip.start_time),
            out_point: clip.trim_start + (out_time - clip.start_time),
        }
    }

    /// Length of the trimmed range.
    pub fn duration(&self) -> f64 {
        self.out_point - self.in_point
    }

    /// `out_point` must follow `in_point`; both must be finite and the in
    /// point cannot precede the source start.
    pub fn validate(&self) -> Result<()> {
        if !self.in_point.is_finite() || !self.out_point.is_finite() {
            return Err(CutlineError::invalid_range("trim points must be finite"));
        }
        if self.out_point <= self.in_point {
            return Err(CutlineError::invalid_range(format!(
                "out point {} must be after in point {}",
                self.out_point, self.in_point
            )));
        }
        if self.in_point < 0.0 {
            return Err(CutlineError::invalid_range(format!(
                "in point {} is before the source start",
                self.in_point
            )));
        }
        Ok(())
    }

    /// Additionally require the range to fit inside a source of
    /// `source_duration` seconds.
    pub fn validate_within(&self, source_duration: f64) -> Result<()> {
        self.validate()?;
        if self.out_point > source_duration {
            return Err(CutlineError::invalid_range(format!(
                "out point {} is past the source end {}",
                self.out_point, source_duration
            )));
        }
        Ok(())
    }
}

/// Adjusts a placed clip's in/out range.
pub struct TrimEngine;

impl TrimEngine {
    /// Set a clip's source range to `[in_point, out_point]`.
    ///
    /// The clip keeps its start time and takes `out_point - in_point` as its
    /// new duration. Neighbouring clips are not touched.
    pub fn apply_trim(
        model: &mut TimelineModel,
        clip_id: Uuid,
        in_point: f64,
        out_point: f64,
    ) -> Result<TimelineClip> {
        Self::apply(model, clip_id, TrimPoints::new(in_point, out_point))
    }

    /// Same as [`TrimEngine::apply_trim`], taking a [`TrimPoints`].
    pub fn apply(
        model: &mut TimelineModel,
        clip_id: Uuid,
        points: TrimPoints,
    ) -> Result<TimelineClip> {
        points.validate()?;
        if !model.contains(clip_id) {
            return Err(CutlineError::NotFound(clip_id));
        }
        model.update(
            clip_id,
            ClipPatch::new()
                .duration(points.duration())
                .trim(points.in_point, points.out_point),
        )
    }
}
