//! Splitting one placed clip into two contiguous clips.

use cutline_core::{nearly_equal, CutlineError, Result};
use uuid::Uuid;

use crate::clip::{TimelineClip, TrackId};
use crate::model::TimelineModel;

/// The two halves produced by a split. `left` keeps the original id.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPair {
    /// The clip as it was before the cut.
    pub original: TimelineClip,
    pub left: TimelineClip,
    pub right: TimelineClip,
}

/// Divides clips at a time point.
pub struct SplitEngine;

impl SplitEngine {
    /// Split the clip under `split_time`, searching every track.
    ///
    /// Returns `Ok(None)` and leaves the model untouched when no clip covers
    /// `split_time`. Splitting exactly on a clip edge is rejected with
    /// `InvalidRange`, since one half would have zero length.
    pub fn split_at(model: &mut TimelineModel, split_time: f64) -> Result<Option<SplitPair>> {
        Self::split_where(model, split_time, |_| true)
    }

    /// Split the clip under `split_time` on one track only.
    pub fn split_track_at(
        model: &mut TimelineModel,
        track_id: TrackId,
        split_time: f64,
    ) -> Result<Option<SplitPair>> {
        Self::split_where(model, split_time, |clip| clip.track_id == track_id)
    }

    /// Split a specific clip. Fails with `NotFound` for an unknown id and
    /// `InvalidRange` when `split_time` is not strictly inside the clip.
    pub fn split_clip(
        model: &mut TimelineModel,
        clip_id: Uuid,
        split_time: f64,
    ) -> Result<SplitPair> {
        let clip = model.get(clip_id).ok_or(CutlineError::NotFound(clip_id))?;
        let pair = Self::compute(clip, split_time)?;
        model.replace_and_insert(pair.left.clone(), pair.right.clone())?;
        Ok(pair)
    }

    /// Compute the halves of `clip` split at `split_time` without touching
    /// any model.
    pub fn compute(clip: &TimelineClip, split_time: f64) -> Result<SplitPair> {
        if !split_time.is_finite() || !clip.timeline_range().contains_inclusive(split_time) {
            return Err(CutlineError::invalid_range(format!(
                "split time {} is outside clip {}",
                split_time, clip.id
            )));
        }
        if is_on_edge(clip, split_time) {
            return Err(CutlineError::invalid_range(format!(
                "split time {} is on an edge of clip {}",
                split_time, clip.id
            )));
        }

        let split_offset = split_time - clip.start_time;

        let mut left = clip.clone();
        left.duration = split_offset;
        left.trim_end = clip.trim_start + split_offset;

        let right = TimelineClip {
            id: Uuid::new_v4(),
            source_clip_id: clip.source_clip_id,
            track_id: clip.track_id,
            start_time: split_time,
            duration: clip.duration - split_offset,
            trim_start: clip.trim_start + split_offset,
            trim_end: clip.trim_end,
        };

        Ok(SplitPair {
            original: clip.clone(),
            left,
            right,
        })
    }

    fn split_where(
        model: &mut TimelineModel,
        split_time: f64,
        filter: impl Fn(&TimelineClip) -> bool,
    ) -> Result<Option<SplitPair>> {
        let clips = model.clips();
        let inside = clips.iter().filter(|&c| filter(c)).find(|c| {
            c.timeline_range().contains_strictly(split_time) && !is_on_edge(c, split_time)
        });
        let pair = match inside {
            Some(target) => Self::compute(target, split_time)?,
            None => {
                let on_edge = clips
                    .iter()
                    .filter(|&c| filter(c))
                    .any(|c| is_on_edge(c, split_time));
                if on_edge {
                    return Err(CutlineError::invalid_range(format!(
                        "split time {} falls on a clip edge",
                        split_time
                    )));
                }
                return Ok(None);
            }
        };

        model.replace_and_insert(pair.left.clone(), pair.right.clone())?;
        Ok(Some(pair))
    }
}

fn is_on_edge(clip: &TimelineClip, time: f64) -> bool {
    nearly_equal(time, clip.start_time) || nearly_equal(time, clip.end_time())
}
