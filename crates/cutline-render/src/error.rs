//! Error types for rendering.

use cutline_core::CutlineError;
use thiserror::Error;

/// Failures surfaced by an encoder.
///
/// Encoder failures are passed through as text; the editing core never
/// tries to interpret them.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start encoder: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoder failed: {0}")]
    Failed(String),

    #[error("Render cancelled")]
    Cancelled,

    #[error("Render plan is empty")]
    EmptyPlan,

    #[error("Invalid render plan: {0}")]
    Plan(#[from] CutlineError),
}

/// Result type alias for rendering.
pub type Result<T> = std::result::Result<T, RenderError>;
