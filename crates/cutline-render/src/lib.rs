//! Cutline Render - the encoder side of export
//!
//! This crate handles:
//! - The `Encoder` seam the editing core hands render plans to
//! - Export presets (resolution, quality, container)
//! - Progress reporting and cancellation for out-of-band renders
//! - An FFmpeg-process encoder

pub mod encoder;
pub mod error;
pub mod export;
pub mod ffmpeg;

pub use encoder::{Encoder, RenderHandle};
pub use error::{RenderError, Result};
pub use export::{
    ContainerFormat, ExportCancel, ExportProgress, QualityPreset, RenderJob, ResolutionPreset,
};
pub use ffmpeg::{FfmpegEncoder, ProgressParser};
