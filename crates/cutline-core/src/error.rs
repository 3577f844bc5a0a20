//! Error types for Cutline.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for Cutline operations.
///
/// Every variant is returned as a value; a command that fails with any of
/// these leaves the timeline exactly as it was before the call.
#[derive(Error, Debug)]
pub enum CutlineError {
    /// Trim or split arguments violate ordering constraints.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// A timeline clip id that is not in the model.
    #[error("Clip not found: {0}")]
    NotFound(Uuid),

    /// An export plan references a source clip the library no longer holds.
    #[error("Missing source clip: {0}")]
    MissingSource(Uuid),

    /// A clip with this id is already in the model.
    #[error("Duplicate clip id: {0}")]
    DuplicateId(Uuid),

    /// A placement would overlap another clip while overlaps are rejected.
    #[error("Clip would overlap {existing} on track {track}")]
    Overlap { track: u32, existing: Uuid },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CutlineError {
    /// Shorthand for building an `InvalidRange` error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    /// True for errors caused by bad caller arguments rather than environment.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange(_) | Self::NotFound(_) | Self::Overlap { .. }
        )
    }
}

/// Result type alias for Cutline operations.
pub type Result<T> = std::result::Result<T, CutlineError>;
