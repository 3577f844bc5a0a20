//! Export job description: output path, presets, progress and cancellation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ── Format presets ──────────────────────────────────────────────

/// Output frame size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionPreset {
    /// Keep each source's own frame size.
    #[default]
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
}

impl ResolutionPreset {
    /// Target `(width, height)`, or `None` to keep the source size.
    pub fn dimensions(self) -> Option<(u32, u32)> {
        match self {
            Self::Source => None,
            Self::P1080 => Some((1920, 1080)),
            Self::P720 => Some((1280, 720)),
            Self::P480 => Some((640, 480)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
        }
    }
}

/// Export quality preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    #[default]
    High,
    Medium,
    Low,
}

impl QualityPreset {
    /// CRF value for H.264 (0-51, lower = better).
    pub fn crf(self) -> u32 {
        match self {
            Self::High => 18,
            Self::Medium => 23,
            Self::Low => 28,
        }
    }

    /// x264 speed preset.
    pub fn encoder_preset(self) -> &'static str {
        match self {
            Self::High => "slow",
            Self::Medium => "medium",
            Self::Low => "veryfast",
        }
    }

    /// Audio bitrate in kbps.
    pub fn audio_bitrate(self) -> u32 {
        match self {
            Self::High => 192,
            Self::Medium => 160,
            Self::Low => 128,
        }
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Mp4,
    Mov,
}

impl ContainerFormat {
    /// File extension, which is also the FFmpeg muxer name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
        }
    }
}

// ── Export job ──────────────────────────────────────────────────

/// Where and how to render a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub output_path: PathBuf,
    #[serde(default)]
    pub resolution: ResolutionPreset,
    #[serde(default)]
    pub quality: QualityPreset,
    #[serde(default)]
    pub format: ContainerFormat,
}

impl RenderJob {
    /// Job with source resolution, high quality, MP4.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            resolution: ResolutionPreset::default(),
            quality: QualityPreset::default(),
            format: ContainerFormat::default(),
        }
    }

    pub fn with_resolution(mut self, resolution: ResolutionPreset) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_quality(mut self, quality: QualityPreset) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: ContainerFormat) -> Self {
        self.format = format;
        self
    }

    /// Output path with the container's extension applied when the path has
    /// none.
    pub fn resolved_output_path(&self) -> PathBuf {
        if self.output_path.extension().is_some() {
            self.output_path.clone()
        } else {
            self.output_path.with_extension(self.format.extension())
        }
    }
}

/// Export progress information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportProgress {
    /// Seconds of output written so far.
    pub rendered_seconds: f64,
    /// Length of the finished output in seconds.
    pub total_seconds: f64,
    /// Encoding speed relative to real time, when the encoder reports it.
    pub speed: Option<f64>,
}

impl ExportProgress {
    /// Completion percentage (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total_seconds <= 0.0 {
            return 0.0;
        }
        (self.rendered_seconds / self.total_seconds).clamp(0.0, 1.0)
    }

    /// Estimated seconds remaining, if the speed is known.
    pub fn eta_seconds(&self) -> Option<f64> {
        let speed = self.speed.filter(|s| *s > 0.0)?;
        Some(((self.total_seconds - self.rendered_seconds) / speed).max(0.0))
    }
}

/// Handle for cancelling an in-progress export.
#[derive(Debug, Clone)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for ExportCancel {
    fn default() -> Self {
        Self::new()
    }
}
