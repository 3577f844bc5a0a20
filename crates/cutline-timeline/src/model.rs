//! The timeline model: the single owner of every placed clip.
//!
//! Clips are kept in one `Vec` ordered by `start_time`. Clips with equal
//! start times keep their relative insertion order, so iteration order is
//! stable and doubles as the tie-break for snapping and playhead lookup.

use cutline_core::{CutlineError, Result};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::clip::{ClipPatch, TimelineClip, TrackId};

/// Ordered set of clips across all tracks.
#[derive(Debug, Clone, Default)]
pub struct TimelineModel {
    clips: Vec<TimelineClip>,
}

impl TimelineModel {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a clip. Fails without touching the model if the clip breaks a
    /// record invariant or its id is already present.
    pub fn add(&mut self, clip: TimelineClip) -> Result<Uuid> {
        clip.validate()?;
        if self.contains(clip.id) {
            return Err(CutlineError::DuplicateId(clip.id));
        }
        let id = clip.id;
        self.insert_sorted(clip);
        Ok(id)
    }

    /// Insert a clip at a known list position, e.g. the one it held before
    /// it was removed. Clips sharing a start time keep that order.
    ///
    /// An `index` past the end is clamped. If the position would break the
    /// start-time ordering the clip is inserted as by [`add`](Self::add).
    pub fn restore_at(&mut self, index: usize, clip: TimelineClip) -> Result<Uuid> {
        clip.validate()?;
        if self.contains(clip.id) {
            return Err(CutlineError::DuplicateId(clip.id));
        }
        let id = clip.id;
        let index = index.min(self.clips.len());
        let after_prev = index == 0 || self.clips[index - 1].start_time <= clip.start_time;
        let before_next = self
            .clips
            .get(index)
            .map_or(true, |next| clip.start_time <= next.start_time);
        if after_prev && before_next {
            self.clips.insert(index, clip);
        } else {
            self.insert_sorted(clip);
        }
        Ok(id)
    }

    /// Remove a clip by id. Returns false if it was not present.
    pub fn remove(&mut self, id: Uuid) -> bool {
        self.take(id).is_some()
    }

    /// Remove a clip by id and hand it back.
    pub fn take(&mut self, id: Uuid) -> Option<TimelineClip> {
        let index = self.position(id)?;
        Some(self.clips.remove(index))
    }

    /// Apply a partial update and return the updated clip.
    pub fn update(&mut self, id: Uuid, patch: ClipPatch) -> Result<TimelineClip> {
        let current = self.get(id).ok_or(CutlineError::NotFound(id))?;
        let updated = patch.applied_to(current);
        self.replace(updated.clone())?;
        Ok(updated)
    }

    /// Swap in a new version of an existing clip (matched by id).
    /// Returns the previous version.
    pub fn replace(&mut self, clip: TimelineClip) -> Result<TimelineClip> {
        clip.validate()?;
        let index = self.position(clip.id).ok_or(CutlineError::NotFound(clip.id))?;
        let previous = std::mem::replace(&mut self.clips[index], clip);
        self.resort();
        Ok(previous)
    }

    /// Replace an existing clip and insert a new one in a single step.
    /// Both records are validated before either is written.
    pub fn replace_and_insert(
        &mut self,
        replacement: TimelineClip,
        inserted: TimelineClip,
    ) -> Result<()> {
        replacement.validate()?;
        inserted.validate()?;
        let index = self
            .position(replacement.id)
            .ok_or(CutlineError::NotFound(replacement.id))?;
        if inserted.id == replacement.id || self.contains(inserted.id) {
            return Err(CutlineError::DuplicateId(inserted.id));
        }
        self.clips[index] = replacement;
        self.resort();
        self.insert_sorted(inserted);
        Ok(())
    }

    /// Remove every clip, returning them in list order.
    pub fn clear(&mut self) -> Vec<TimelineClip> {
        std::mem::take(&mut self.clips)
    }

    /// Look up a clip by id.
    pub fn get(&self, id: Uuid) -> Option<&TimelineClip> {
        self.clips.iter().find(|c| c.id == id)
    }

    /// List position of a clip.
    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.position(id)
    }

    /// Check whether a clip id is present.
    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    /// All clips ordered by start time.
    pub fn clips(&self) -> &[TimelineClip] {
        &self.clips
    }

    /// Snapshot of the clips ordered by start time, optionally restricted
    /// to one track.
    pub fn list(&self, track: Option<TrackId>) -> Vec<TimelineClip> {
        match track {
            Some(track) => self.track_clips(track).cloned().collect(),
            None => self.clips.clone(),
        }
    }

    /// Iterate the clips of one track in start-time order.
    pub fn track_clips(&self, track: TrackId) -> impl Iterator<Item = &TimelineClip> {
        self.clips.iter().filter(move |c| c.track_id == track)
    }

    /// Distinct track ids in use, ascending.
    pub fn tracks(&self) -> SmallVec<[TrackId; 4]> {
        let mut tracks: SmallVec<[TrackId; 4]> = SmallVec::new();
        for clip in &self.clips {
            if let Err(pos) = tracks.binary_search(&clip.track_id) {
                tracks.insert(pos, clip.track_id);
            }
        }
        tracks
    }

    /// Number of clips on the timeline.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// End of the last clip, or zero for an empty timeline.
    pub fn content_end(&self) -> f64 {
        self.clips.iter().map(|c| c.end_time()).fold(0.0, f64::max)
    }

    /// Timeline length for display: the content end, floored at `minimum`.
    pub fn display_duration(&self, minimum: f64) -> f64 {
        self.content_end().max(minimum)
    }

    fn position(&self, id: Uuid) -> Option<usize> {
        self.clips.iter().position(|c| c.id == id)
    }

    /// Insert after every clip starting at or before this one.
    fn insert_sorted(&mut self, clip: TimelineClip) {
        let index = self
            .clips
            .partition_point(|c| c.start_time <= clip.start_time);
        self.clips.insert(index, clip);
    }

    /// Stable re-sort after an in-place change.
    fn resort(&mut self) {
        self.clips
            .sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    }
}
