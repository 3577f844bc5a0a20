//! Placement and snapping for inserting and moving clips.

use cutline_core::{CutlineError, Result, TimeRange};
use uuid::Uuid;

use crate::clip::{ClipPatch, TimelineClip, TrackId};
use crate::config::{EditorConfig, OverlapPolicy, SnapConfig};
use crate::model::TimelineModel;

/// A position a dragged clip can be pulled to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub time: f64,
    pub kind: SnapKind,
}

/// Kind of snap point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapKind {
    GridLine,
    ClipStart,
    ClipEnd,
}

/// Computes valid, optionally snapped clip positions and writes placements
/// into the model.
#[derive(Debug, Clone, Copy)]
pub struct PlacementEngine {
    pub snap: SnapConfig,
    pub overlap_policy: OverlapPolicy,
    /// Floor for the timeline length used as the clamp bound when moving.
    pub min_display_duration: f64,
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new(SnapConfig::default(), OverlapPolicy::Allow)
    }
}

impl PlacementEngine {
    pub fn new(snap: SnapConfig, overlap_policy: OverlapPolicy) -> Self {
        Self {
            snap,
            overlap_policy,
            min_display_duration: cutline_core::display::MIN_TIMELINE_DURATION,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            snap: config.snap,
            overlap_policy: config.overlap_policy,
            min_display_duration: config.min_display_duration,
        }
    }

    /// Resolve a candidate position on a timeline of `timeline_duration`.
    ///
    /// The candidate is clamped to `[0, timeline_duration]`. With snapping on,
    /// a grid multiple within the threshold wins; failing that, the first
    /// start or end edge of another clip within the threshold, scanned in
    /// list order. Otherwise the clamped candidate is returned.
    ///
    /// Snap targets outside `[0, timeline_duration]` are skipped, so a grid
    /// multiple past the end of the timeline is never returned even when the
    /// candidate is within the threshold of it.
    pub fn resolve_position(
        &self,
        candidate: f64,
        timeline_duration: f64,
        exclude_clip: Option<Uuid>,
        clips: &[TimelineClip],
        snap_enabled: bool,
    ) -> f64 {
        let upper = if timeline_duration.is_finite() {
            timeline_duration.max(0.0)
        } else {
            0.0
        };
        let clamped = if candidate.is_nan() {
            0.0
        } else {
            candidate.clamp(0.0, upper)
        };
        if !snap_enabled {
            return clamped;
        }

        self.find_snap(clamped, upper, exclude_clip, clips)
            .map(|point| point.time)
            .unwrap_or(clamped)
    }

    /// Find the snap point for an already-clamped position, if any.
    pub fn find_snap(
        &self,
        time: f64,
        upper: f64,
        exclude_clip: Option<Uuid>,
        clips: &[TimelineClip],
    ) -> Option<SnapPoint> {
        let threshold = self.snap.threshold;
        let in_bounds = |t: f64| (0.0..=upper).contains(&t);

        if self.snap.grid_interval > 0.0 {
            let grid = (time / self.snap.grid_interval).round() * self.snap.grid_interval;
            if (grid - time).abs() <= threshold && in_bounds(grid) {
                return Some(SnapPoint {
                    time: grid,
                    kind: SnapKind::GridLine,
                });
            }
        }

        clips
            .iter()
            .filter(|clip| Some(clip.id) != exclude_clip)
            .flat_map(|clip| {
                [
                    SnapPoint {
                        time: clip.start_time,
                        kind: SnapKind::ClipStart,
                    },
                    SnapPoint {
                        time: clip.end_time(),
                        kind: SnapKind::ClipEnd,
                    },
                ]
            })
            .find(|point| (point.time - time).abs() <= threshold && in_bounds(point.time))
    }

    /// Create a clip playing its source from the start and insert it.
    ///
    /// The start time is taken as given; callers that want snapping resolve
    /// it first.
    pub fn place(
        &self,
        model: &mut TimelineModel,
        source_clip_id: Uuid,
        track_id: TrackId,
        start_time: f64,
        duration: f64,
    ) -> Result<TimelineClip> {
        let clip = TimelineClip::new(source_clip_id, track_id, start_time, duration);
        clip.validate()?;
        self.check_overlap(model.clips(), track_id, clip.timeline_range(), None)?;
        model.add(clip.clone())?;
        Ok(clip)
    }

    /// Move a clip to a new start time and track. The start time is
    /// re-resolved against the current timeline, excluding the clip itself.
    pub fn move_clip(
        &self,
        model: &mut TimelineModel,
        clip_id: Uuid,
        new_start_time: f64,
        new_track_id: TrackId,
        snap_enabled: bool,
    ) -> Result<TimelineClip> {
        let clip = model.get(clip_id).ok_or(CutlineError::NotFound(clip_id))?;
        let timeline_duration = model.display_duration(self.min_display_duration);
        let start = self.resolve_position(
            new_start_time,
            timeline_duration,
            Some(clip_id),
            model.clips(),
            snap_enabled,
        );
        let range = TimeRange::new(start, clip.duration);
        self.check_overlap(model.clips(), new_track_id, range, Some(clip_id))?;
        model.update(clip_id, ClipPatch::new().start(start).track(new_track_id))
    }

    /// Enforce the overlap policy for a prospective placement.
    pub fn check_overlap(
        &self,
        clips: &[TimelineClip],
        track_id: TrackId,
        range: TimeRange,
        exclude_clip: Option<Uuid>,
    ) -> Result<()> {
        if self.overlap_policy == OverlapPolicy::Allow {
            return Ok(());
        }
        match find_overlap(clips, track_id, range, exclude_clip) {
            Some(existing) => Err(CutlineError::Overlap {
                track: track_id,
                existing: existing.id,
            }),
            None => Ok(()),
        }
    }
}

/// First clip on `track_id` (other than `exclude_clip`) whose range
/// overlaps `range`. Touching edges do not count.
pub fn find_overlap<'a>(
    clips: &'a [TimelineClip],
    track_id: TrackId,
    range: TimeRange,
    exclude_clip: Option<Uuid>,
) -> Option<&'a TimelineClip> {
    clips.iter().find(|clip| {
        clip.track_id == track_id
            && Some(clip.id) != exclude_clip
            && clip.timeline_range().overlaps(range)
    })
}
