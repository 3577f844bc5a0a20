//! Cutline Timeline - Timeline editing engine
//!
//! Implements the editing core behind the multi-track timeline:
//! - Placed clips and the ordered timeline model
//! - Placement with grid and edge snapping
//! - Trimming and splitting
//! - Playhead resolution for preview binding
//! - Render plans for the external encoder
//! - Edit commands with undo/redo, wrapped in an editing session

pub mod clip;
pub mod config;
pub mod edit;
pub mod library;
pub mod model;
pub mod placement;
pub mod plan;
pub mod playhead;
pub mod session;
pub mod split;
pub mod trim;

pub use clip::{ClipPatch, TimelineClip, TrackId};
pub use config::{EditorConfig, OverlapPolicy, SnapConfig};
pub use edit::{EditCommand, UndoStack};
pub use library::{ClipLibrary, InMemoryClipLibrary, SourceClip};
pub use model::TimelineModel;
pub use placement::{find_overlap, PlacementEngine, SnapKind, SnapPoint};
pub use plan::{ExportPlanner, PlanSegment, RenderPlan};
pub use playhead::{PlaybackTarget, PlayheadResolver};
pub use session::{EditorSession, SharedSession};
pub use split::{SplitEngine, SplitPair};
pub use trim::{TrimEngine, TrimPoints};
