//! Editor configuration.
//!
//! Stored as JSON. Every field has a default, so a partial file (or `{}`)
//! is a valid configuration.

use std::path::Path;

use cutline_core::{display, CutlineError, Result};
use serde::{Deserialize, Serialize};

/// How clips on the same track may share time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Overlaps are allowed; lookups resolve ties by list order.
    #[default]
    Allow,
    /// `place` and `move` fail if the result would overlap a clip on the same track.
    Reject,
}

/// Snapping behaviour for placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Grid interval in seconds (0 = grid disabled).
    pub grid_interval: f64,
    /// Maximum distance, in seconds, a position is pulled to a snap target.
    pub threshold: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid_interval: 1.0,
            threshold: 0.5,
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub snap: SnapConfig,
    pub overlap_policy: OverlapPolicy,
    /// Shortest timeline shown, in seconds.
    pub min_display_duration: f64,
    /// Maximum undo history depth.
    pub undo_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap: SnapConfig::default(),
            overlap_policy: OverlapPolicy::Allow,
            min_display_duration: display::MIN_TIMELINE_DURATION,
            undo_depth: 200,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| CutlineError::Config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_json(&data)
    }

    /// Serialize to pretty JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CutlineError::Serialization(format!("Failed to serialize config: {}", e)))
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("snap.grid_interval", self.snap.grid_interval),
            ("snap.threshold", self.snap.threshold),
            ("min_display_duration", self.min_display_duration),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(CutlineError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.undo_depth == 0 {
            return Err(CutlineError::Config("undo_depth must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert!(config.snap.enabled);
        assert_eq!(config.snap.grid_interval, 1.0);
        assert_eq!(config.snap.threshold, 0.5);
        assert_eq!(config.overlap_policy, OverlapPolicy::Allow);
        assert_eq!(config.min_display_duration, 60.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            EditorConfig::from_json(br#"{"overlap_policy": "reject", "snap": {"threshold": 0.25}}"#)
                .unwrap();
        assert_eq!(config.overlap_policy, OverlapPolicy::Reject);
        assert_eq!(config.snap.threshold, 0.25);
        assert_eq!(config.snap.grid_interval, 1.0);
        assert_eq!(config.undo_depth, 200);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = EditorConfig::default();
        config.snap.enabled = false;
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            EditorConfig::from_json(br#"{"snap": {"threshold": -1.0}}"#),
            Err(CutlineError::Config(_))
        ));
        assert!(EditorConfig::from_json(br#"{"undo_depth": 0}"#).is_err());
        assert!(EditorConfig::from_json(b"not json").is_err());
    }
}
