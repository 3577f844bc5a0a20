//! Edit operations with undo/redo support.
//!
//! Uses the Command pattern: every successful mutation is recorded as an
//! `EditCommand` holding full before/after clip records, so it can be
//! re-applied or inverted without consulting any other state.

use cutline_core::{CutlineError, Result};

use crate::clip::TimelineClip;
use crate::model::TimelineModel;

// ── Edit commands ───────────────────────────────────────────────

/// A reversible edit on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Insert a clip at list position `index`.
    Insert { clip: TimelineClip, index: usize },
    /// Remove a clip. Holds the removed record and the list position it
    /// held, for undo.
    Remove { clip: TimelineClip, index: usize },
    /// Replace a clip's fields (move, trim).
    Replace {
        before: TimelineClip,
        after: TimelineClip,
    },
    /// Split `original` into `left` (same id) and `right`.
    Split {
        original: TimelineClip,
        left: TimelineClip,
        right: TimelineClip,
    },
    /// Undo of a split: drop `right` and restore `original` over `left`.
    Merge {
        left: TimelineClip,
        right: TimelineClip,
        original: TimelineClip,
    },
    /// A batch of commands applied atomically.
    Batch(Vec<EditCommand>),
}

impl EditCommand {
    /// Apply this command to a model.
    ///
    /// A failing command leaves the model unchanged; for batches the
    /// already-applied part is rolled back.
    pub fn apply(&self, model: &mut TimelineModel) -> Result<()> {
        match self {
            Self::Insert { clip, index } => {
                model.restore_at(*index, clip.clone())?;
            }
            Self::Remove { clip, .. } => {
                if !model.remove(clip.id) {
                    return Err(CutlineError::NotFound(clip.id));
                }
            }
            Self::Replace { after, .. } => {
                model.replace(after.clone())?;
            }
            Self::Split { left, right, .. } => {
                model.replace_and_insert(left.clone(), right.clone())?;
            }
            Self::Merge {
                right, original, ..
            } => {
                if !model.contains(right.id) {
                    return Err(CutlineError::NotFound(right.id));
                }
                model.replace(original.clone())?;
                model.remove(right.id);
            }
            Self::Batch(commands) => {
                for (applied, cmd) in commands.iter().enumerate() {
                    if let Err(e) = cmd.apply(model) {
                        for done in commands[..applied].iter().rev() {
                            // Inverses of commands that just succeeded cannot fail.
                            let _ = done.inverse().apply(model);
                        }
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::Insert { clip, index } => Self::Remove {
                clip: clip.clone(),
                index: *index,
            },
            Self::Remove { clip, index } => Self::Insert {
                clip: clip.clone(),
                index: *index,
            },
            Self::Replace { before, after } => Self::Replace {
                before: after.clone(),
                after: before.clone(),
            },
            Self::Split {
                original,
                left,
                right,
            } => Self::Merge {
                left: left.clone(),
                right: right.clone(),
                original: original.clone(),
            },
            Self::Merge {
                left,
                right,
                original,
            } => Self::Split {
                original: original.clone(),
                left: left.clone(),
                right: right.clone(),
            },
            Self::Batch(commands) => {
                Self::Batch(commands.iter().rev().map(|c| c.inverse()).collect())
            }
        }
    }

    /// Short name for logs and history menus.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
            Self::Split { .. } => "split",
            Self::Merge { .. } => "merge",
            Self::Batch(_) => "batch",
        }
    }
}

// ── Undo stack ──────────────────────────────────────────────────

/// Undo/redo history stack.
#[derive(Debug)]
pub struct UndoStack {
    /// Commands that have been executed (most recent last).
    undo: Vec<EditCommand>,
    /// Commands that have been undone (most recent last).
    redo: Vec<EditCommand>,
    /// Maximum history depth.
    max_depth: usize,
}

impl UndoStack {
    /// Create a new undo stack with the given maximum depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth,
        }
    }

    /// Push a command onto the undo stack after it has been executed.
    /// Clears the redo stack (new action invalidates redo history).
    pub fn push(&mut self, command: EditCommand) {
        self.redo.clear();
        self.undo.push(command);
        if self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
    }

    /// Undo the most recent command against `model`.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. If the inverse
    /// cannot be applied the command stays on the undo stack.
    pub fn undo(&mut self, model: &mut TimelineModel) -> Result<bool> {
        let Some(cmd) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.inverse().apply(model) {
            self.undo.push(cmd);
            return Err(e);
        }
        self.redo.push(cmd);
        Ok(true)
    }

    /// Re-apply the most recently undone command against `model`.
    pub fn redo(&mut self, model: &mut TimelineModel) -> Result<bool> {
        let Some(cmd) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(e) = cmd.apply(model) {
            self.redo.push(cmd);
            return Err(e);
        }
        self.undo.push(cmd);
        Ok(true)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(200)
    }
}

// ── Tests ───────────────────────────────────────────────────────
