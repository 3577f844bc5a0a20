//! Source clip library seam.
//!
//! The library is owned by the media/capture side of the application. The
//! timeline only reads from it through [`ClipLibrary`].

use std::path::PathBuf;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An imported or recorded media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceClip {
    /// Unique source ID
    pub id: Uuid,
    /// Intrinsic media duration in seconds
    pub duration_seconds: f64,
    /// Whether the file carries an audio stream
    pub has_audio: bool,
    /// Whether the file carries a video stream (false for microphone takes)
    #[serde(default = "default_has_video")]
    pub has_video: bool,
    /// Display name
    pub name: String,
    /// Path to the media file
    pub path: PathBuf,
}

impl SourceClip {
    /// Create a source record for a media file.
    pub fn new(path: impl Into<PathBuf>, duration_seconds: f64, has_audio: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Clip".to_string());
        Self {
            id: Uuid::new_v4(),
            duration_seconds,
            has_audio,
            has_video: true,
            name,
            path,
        }
    }

    /// Mark whether the source has a video stream.
    pub fn with_video(mut self, has_video: bool) -> Self {
        self.has_video = has_video;
        self
    }
}

fn default_has_video() -> bool {
    true
}

/// Read access to source clips, by id.
pub trait ClipLibrary: Send + Sync {
    /// Look up a source clip.
    fn get_clip(&self, id: Uuid) -> Option<SourceClip>;

    /// Check whether a source clip is present.
    fn contains(&self, id: Uuid) -> bool {
        self.get_clip(id).is_some()
    }
}

/// Thread-safe in-memory library, kept in import order.
#[derive(Debug, Default)]
pub struct InMemoryClipLibrary {
    clips: RwLock<Vec<SourceClip>>,
}

impl InMemoryClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source clip. A clip with the same id is replaced.
    pub fn add(&self, clip: SourceClip) -> Uuid {
        let id = clip.id;
        let mut clips = self.clips.write();
        match clips.iter_mut().find(|c| c.id == id) {
            Some(existing) => *existing = clip,
            None => clips.push(clip),
        }
        id
    }

    /// Remove a source clip, returning it if it was present.
    pub fn remove(&self, id: Uuid) -> Option<SourceClip> {
        let mut clips = self.clips.write();
        let index = clips.iter().position(|c| c.id == id)?;
        Some(clips.remove(index))
    }

    /// Modify a source clip in place. Returns false if it was not present.
    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut SourceClip)) -> bool {
        let mut clips = self.clips.write();
        match clips.iter_mut().find(|c| c.id == id) {
            Some(clip) => {
                f(clip);
                true
            }
            None => false,
        }
    }

    /// Snapshot of every source clip, in import order.
    pub fn list(&self) -> Vec<SourceClip> {
        self.clips.read().clone()
    }

    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }
}

impl ClipLibrary for InMemoryClipLibrary {
    fn get_clip(&self, id: Uuid) -> Option<SourceClip> {
        self.clips.read().iter().find(|c| c.id == id).cloned()
    }

    fn contains(&self, id: Uuid) -> bool {
        self.clips.read().iter().any(|c| c.id == id)
    }
}
