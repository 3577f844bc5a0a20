//! Resolving the playhead to clips and source positions.
//!
//! Everything here is a pure function of its arguments. The playback clock
//! calls in on every tick, in any order and at any rate, without being able
//! to disturb the model.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::clip::{TimelineClip, TrackId};

/// What the preview should show for one track at one playhead position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackTarget {
    pub clip_id: Uuid,
    pub source_clip_id: Uuid,
    pub track_id: TrackId,
    /// Position to seek to within the source clip, in seconds.
    pub media_time: f64,
}

/// Resolves transport time against a clip list ordered by start time.
pub struct PlayheadResolver;

impl PlayheadResolver {
    /// The clip on `track_id` covering `playhead` in `[start, end)`.
    /// If clips overlap, the first in list order wins.
    pub fn active_clip(
        playhead: f64,
        track_id: TrackId,
        clips: &[TimelineClip],
    ) -> Option<&TimelineClip> {
        clips
            .iter()
            .find(|c| c.track_id == track_id && c.timeline_range().contains(playhead))
    }

    /// The active clip on every track that has one, ordered by track id.
    pub fn active_clips(
        playhead: f64,
        clips: &[TimelineClip],
    ) -> SmallVec<[&TimelineClip; 4]> {
        let mut active: SmallVec<[&TimelineClip; 4]> = SmallVec::new();
        for clip in clips.iter().filter(|c| c.timeline_range().contains(playhead)) {
            if let Err(pos) = active.binary_search_by_key(&clip.track_id, |c| c.track_id) {
                active.insert(pos, clip);
            }
        }
        active
    }

    /// Source position that corresponds to `playhead` within `clip`.
    #[inline]
    pub fn media_time_for(clip: &TimelineClip, playhead: f64) -> f64 {
        clip.trim_start + (playhead - clip.start_time)
    }

    /// Timeline position that corresponds to a source position reported by
    /// the player while `clip` is playing.
    #[inline]
    pub fn timeline_time_for(clip: &TimelineClip, media_time: f64) -> f64 {
        clip.start_time + (media_time - clip.trim_start)
    }

    /// Active clip and seek position for one track.
    pub fn resolve(
        playhead: f64,
        track_id: TrackId,
        clips: &[TimelineClip],
    ) -> Option<PlaybackTarget> {
        Self::active_clip(playhead, track_id, clips).map(|clip| PlaybackTarget {
            clip_id: clip.id,
            source_clip_id: clip.source_clip_id,
            track_id: clip.track_id,
            media_time: Self::media_time_for(clip, playhead),
        })
    }

    /// The first clip starting at or after `time`, on `track_id` or on any
    /// track. Playback uses this to jump the gap after the current clip ends.
    pub fn next_clip_after(
        time: f64,
        track_id: Option<TrackId>,
        clips: &[TimelineClip],
    ) -> Option<&TimelineClip> {
        let first = clips.partition_point(|c| c.start_time < time);
        clips[first..]
            .iter()
            .find(|c| track_id.map_or(true, |t| c.track_id == t))
    }
}
