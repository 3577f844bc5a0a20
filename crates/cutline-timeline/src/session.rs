//! The editing session: one timeline, its history, and the command surface
//! the UI drives.
//!
//! Every command either succeeds and records one [`EditCommand`], or fails
//! and leaves the timeline exactly as it was.

use std::sync::Arc;

use cutline_core::{CutlineError, Result};
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clip::{TimelineClip, TrackId};
use crate::config::EditorConfig;
use crate::edit::{EditCommand, UndoStack};
use crate::library::ClipLibrary;
use crate::model::TimelineModel;
use crate::placement::PlacementEngine;
use crate::plan::{ExportPlanner, RenderPlan};
use crate::playhead::{PlaybackTarget, PlayheadResolver};
use crate::split::{SplitEngine, SplitPair};
use crate::trim::{TrimEngine, TrimPoints};

/// Owns the timeline model for one editing session.
pub struct EditorSession {
    model: TimelineModel,
    library: Arc<dyn ClipLibrary>,
    config: EditorConfig,
    placement: PlacementEngine,
    history: UndoStack,
}

impl EditorSession {
    pub fn new(library: Arc<dyn ClipLibrary>, config: EditorConfig) -> Result<Self> {
        config.validate()?;
        info!(
            snap = config.snap.enabled,
            overlap_policy = ?config.overlap_policy,
            "Editor session created"
        );
        Ok(Self {
            model: TimelineModel::new(),
            library,
            placement: PlacementEngine::from_config(&config),
            history: UndoStack::new(config.undo_depth),
            config,
        })
    }

    /// Session with the default configuration.
    pub fn with_defaults(library: Arc<dyn ClipLibrary>) -> Self {
        let config = EditorConfig::default();
        Self {
            model: TimelineModel::new(),
            library,
            placement: PlacementEngine::from_config(&config),
            history: UndoStack::new(config.undo_depth),
            config,
        }
    }

    // ── Commands ────────────────────────────────────────────────

    /// Drop a clip onto the timeline at `start_time`.
    ///
    /// The drop position is clamped to the displayed timeline and snapped
    /// when snapping is on. The new clip plays its source from 0.
    pub fn place(
        &mut self,
        source_clip_id: Uuid,
        track_id: TrackId,
        start_time: f64,
        duration: f64,
    ) -> Result<TimelineClip> {
        let start = self.drop_position(start_time);
        let clip = self
            .placement
            .place(&mut self.model, source_clip_id, track_id, start, duration)
            .map_err(|e| rejected("place", e))?;
        debug!(clip = %clip.id, track = track_id, start, duration, "Placed clip");
        let index = self.model.index_of(clip.id).unwrap_or(self.model.len());
        self.history.push(EditCommand::Insert {
            clip: clip.clone(),
            index,
        });
        Ok(clip)
    }

    /// Drop a library clip at its full source length.
    pub fn place_source(
        &mut self,
        source_clip_id: Uuid,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<TimelineClip> {
        let source = self
            .library
            .get_clip(source_clip_id)
            .ok_or(CutlineError::MissingSource(source_clip_id))?;
        self.place(source_clip_id, track_id, start_time, source.duration_seconds)
    }

    /// Move a clip to `new_start_time` on `new_track_id`, re-snapping the
    /// start against the other clips.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        new_start_time: f64,
        new_track_id: TrackId,
    ) -> Result<TimelineClip> {
        let before = self.existing(clip_id)?;
        let after = self
            .placement
            .move_clip(
                &mut self.model,
                clip_id,
                new_start_time,
                new_track_id,
                self.config.snap.enabled,
            )
            .map_err(|e| rejected("move", e))?;
        debug!(clip = %clip_id, start = after.start_time, track = after.track_id, "Moved clip");
        self.history.push(EditCommand::Replace {
            before,
            after: after.clone(),
        });
        Ok(after)
    }

    /// Trim a clip to the source-relative range `[in_point, out_point]`.
    ///
    /// When the source is in the library the range must also fit inside it.
    pub fn trim(&mut self, clip_id: Uuid, in_point: f64, out_point: f64) -> Result<TimelineClip> {
        self.apply_trim(clip_id, TrimPoints::new(in_point, out_point))
    }

    /// Trim using in/out marks taken on the timeline (e.g. at the playhead).
    pub fn trim_to_timeline(
        &mut self,
        clip_id: Uuid,
        in_time: f64,
        out_time: f64,
    ) -> Result<TimelineClip> {
        let clip = self.existing(clip_id)?;
        self.apply_trim(clip_id, TrimPoints::from_timeline(&clip, in_time, out_time))
    }

    /// Split whichever clip lies under `split_time`.
    pub fn split_at(&mut self, split_time: f64) -> Result<Option<SplitPair>> {
        let pair = SplitEngine::split_at(&mut self.model, split_time)
            .map_err(|e| rejected("split", e))?;
        Ok(self.record_split(pair))
    }

    /// Split the clip under `split_time` on one track.
    pub fn split_track_at(
        &mut self,
        track_id: TrackId,
        split_time: f64,
    ) -> Result<Option<SplitPair>> {
        let pair = SplitEngine::split_track_at(&mut self.model, track_id, split_time)
            .map_err(|e| rejected("split", e))?;
        Ok(self.record_split(pair))
    }

    /// Remove a clip. Returns false for an unknown id.
    pub fn remove(&mut self, clip_id: Uuid) -> bool {
        let index = self.model.index_of(clip_id);
        match index.zip(self.model.take(clip_id)) {
            Some((index, clip)) => {
                debug!(clip = %clip_id, index, "Removed clip");
                self.history.push(EditCommand::Remove { clip, index });
                true
            }
            None => {
                debug!(clip = %clip_id, "Remove ignored, clip not found");
                false
            }
        }
    }

    /// Remove every clip as one undoable step. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.model.clear();
        let count = removed.len();
        if count > 0 {
            info!(clips = count, "Timeline cleared");
            // Each entry removes the current front clip.
            self.history.push(EditCommand::Batch(
                removed
                    .into_iter()
                    .map(|clip| EditCommand::Remove { clip, index: 0 })
                    .collect(),
            ));
        }
        count
    }

    pub fn undo(&mut self) -> Result<bool> {
        let undone = self.history.undo(&mut self.model)?;
        if undone {
            debug!(remaining = self.history.undo_count(), "Undo");
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool> {
        let redone = self.history.redo(&mut self.model)?;
        if redone {
            debug!(remaining = self.history.redo_count(), "Redo");
        }
        Ok(redone)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.config.snap.enabled = enabled;
        self.placement.snap.enabled = enabled;
    }

    // ── Queries ─────────────────────────────────────────────────

    pub fn list(&self, track_id: Option<TrackId>) -> Vec<TimelineClip> {
        self.model.list(track_id)
    }

    /// Clips ordered by start time, borrowed.
    pub fn clips(&self) -> &[TimelineClip] {
        self.model.clips()
    }

    pub fn get(&self, clip_id: Uuid) -> Option<&TimelineClip> {
        self.model.get(clip_id)
    }

    pub fn model(&self) -> &TimelineModel {
        &self.model
    }

    pub fn library(&self) -> &Arc<dyn ClipLibrary> {
        &self.library
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn snap_enabled(&self) -> bool {
        self.config.snap.enabled
    }

    /// Displayed timeline length: content end floored at the minimum.
    pub fn timeline_duration(&self) -> f64 {
        self.model.display_duration(self.config.min_display_duration)
    }

    pub fn active_clip(&self, playhead: f64, track_id: TrackId) -> Option<&TimelineClip> {
        PlayheadResolver::active_clip(playhead, track_id, self.model.clips())
    }

    pub fn active_clips(&self, playhead: f64) -> SmallVec<[&TimelineClip; 4]> {
        PlayheadResolver::active_clips(playhead, self.model.clips())
    }

    pub fn resolve(&self, playhead: f64, track_id: TrackId) -> Option<PlaybackTarget> {
        PlayheadResolver::resolve(playhead, track_id, self.model.clips())
    }

    pub fn next_clip_after(&self, time: f64, track_id: Option<TrackId>) -> Option<&TimelineClip> {
        PlayheadResolver::next_clip_after(time, track_id, self.model.clips())
    }

    /// Source position of `clip_id` at `playhead`.
    pub fn media_time(&self, clip_id: Uuid, playhead: f64) -> Result<f64> {
        let clip = self
            .model
            .get(clip_id)
            .ok_or(CutlineError::NotFound(clip_id))?;
        Ok(PlayheadResolver::media_time_for(clip, playhead))
    }

    /// Snapshot the arrangement as a render plan.
    pub fn build_plan(&self) -> Result<RenderPlan> {
        let plan = ExportPlanner::build_plan(self.model.clips(), &*self.library)
            .map_err(|e| rejected("build_plan", e))?;
        info!(
            segments = plan.len(),
            duration = plan.total_duration(),
            "Render plan built"
        );
        Ok(plan)
    }

    // ── Internals ───────────────────────────────────────────────

    fn drop_position(&self, candidate: f64) -> f64 {
        self.placement.resolve_position(
            candidate,
            self.timeline_duration(),
            None,
            self.model.clips(),
            self.config.snap.enabled,
        )
    }

    fn existing(&self, clip_id: Uuid) -> Result<TimelineClip> {
        self.model
            .get(clip_id)
            .cloned()
            .ok_or(CutlineError::NotFound(clip_id))
    }

    fn apply_trim(&mut self, clip_id: Uuid, points: TrimPoints) -> Result<TimelineClip> {
        let before = self.existing(clip_id)?;
        if let Some(source) = self.library.get_clip(before.source_clip_id) {
            points
                .validate_within(source.duration_seconds)
                .map_err(|e| rejected("trim", e))?;
        }
        let after =
            TrimEngine::apply(&mut self.model, clip_id, points).map_err(|e| rejected("trim", e))?;
        debug!(
            clip = %clip_id,
            in_point = points.in_point,
            out_point = points.out_point,
            "Trimmed clip"
        );
        self.history.push(EditCommand::Replace {
            before,
            after: after.clone(),
        });
        Ok(after)
    }

    fn record_split(&mut self, pair: Option<SplitPair>) -> Option<SplitPair> {
        let pair = pair?;
        debug!(clip = %pair.original.id, right = %pair.right.id, "Split clip");
        self.history.push(EditCommand::Split {
            original: pair.original.clone(),
            left: pair.left.clone(),
            right: pair.right.clone(),
        });
        Some(pair)
    }
}

fn rejected(command: &str, err: CutlineError) -> CutlineError {
    if err.is_rejection() {
        debug!(command, error = %err, "Command rejected");
    } else {
        warn!(command, error = %err, "Command failed");
    }
    err
}

// ── Shared handle ───────────────────────────────────────────────

/// A session behind one coarse lock, for hosts that touch it from several
/// threads (UI, playback clock, export).
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<EditorSession>>,
}

impl SharedSession {
    pub fn new(session: EditorSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, EditorSession> {
        self.inner.lock()
    }

    /// Run `f` with the session locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut EditorSession) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
