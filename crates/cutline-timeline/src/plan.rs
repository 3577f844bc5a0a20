//! Export planning: turning the arrangement into an ordered render plan.
//!
//! The plan is an immutable list of source segments handed to the encoder.
//! No encoding, codec selection or file I/O happens here.

use std::sync::Arc;

use cutline_core::{CutlineError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::{TimelineClip, TrackId};
use crate::library::ClipLibrary;

/// One source range for the encoder to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSegment {
    pub source_clip_id: Uuid,
    /// Source in point
    pub trim_start: f64,
    /// Source out point
    pub trim_end: f64,
    pub track_id: TrackId,
    /// Where the segment sits on the timeline
    pub timeline_start: f64,
    /// Whether the source carries audio
    pub has_audio: bool,
    /// Whether the source carries video
    pub has_video: bool,
}

impl PlanSegment {
    /// Length of the segment in seconds.
    pub fn duration(&self) -> f64 {
        self.trim_end - self.trim_start
    }
}

/// Ordered, immutable render plan. Cheap to clone and send to another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    segments: Arc<[PlanSegment]>,
}

impl RenderPlan {
    /// Segments in timeline order.
    pub fn segments(&self) -> &[PlanSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanSegment> {
        self.segments.iter()
    }

    /// Sum of segment lengths, i.e. the length of a concatenated render.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(PlanSegment::duration).sum()
    }

    /// True if any segment carries audio.
    pub fn has_audio(&self) -> bool {
        self.segments.iter().any(|s| s.has_audio)
    }
}

/// Builds render plans from clip lists.
pub struct ExportPlanner;

impl ExportPlanner {
    /// Order `clips` by start time (ties keep list order), check every
    /// source against `library`, and emit the segment list.
    ///
    /// The first clip whose source is missing fails the whole plan.
    pub fn build_plan(clips: &[TimelineClip], library: &dyn ClipLibrary) -> Result<RenderPlan> {
        let mut ordered: Vec<&TimelineClip> = clips.iter().collect();
        ordered.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let segments = ordered
            .into_iter()
            .map(|clip| {
                let source = library
                    .get_clip(clip.source_clip_id)
                    .ok_or(CutlineError::MissingSource(clip.source_clip_id))?;
                Ok(PlanSegment {
                    source_clip_id: clip.source_clip_id,
                    trim_start: clip.trim_start,
                    trim_end: clip.trim_end,
                    track_id: clip.track_id,
                    timeline_start: clip.start_time,
                    has_audio: source.has_audio,
                    has_video: source.has_video,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RenderPlan {
            segments: segments.into(),
        })
    }
}
