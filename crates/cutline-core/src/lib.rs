//! Cutline Core - Foundation types for timeline editing
//!
//! This crate provides the fundamental types shared by the Cutline crates:
//! - Time ranges over the shared timeline axis (seconds)
//! - Tolerance helpers for comparing time positions
//! - Timecode formatting for rulers and playhead displays
//! - The crate-wide error type

pub mod error;
pub mod time;

pub use error::{CutlineError, Result};
pub use time::{format_timecode, nearly_equal, TimeRange, TIME_EPSILON};

/// Timeline display constants.
pub mod display {
    /// The timeline is never displayed shorter than this, in seconds.
    pub const MIN_TIMELINE_DURATION: f64 = 60.0;

    /// Ruler tick spacing, in seconds.
    pub const RULER_TICK_INTERVAL: f64 = 10.0;
}
