// src/error.rs

use thiserror::Error;

/// Errors that abort a pipeline run. Data sparsity (missing ball, empty
/// slots, short subtracks) is never an error; it is represented as absent
/// values in the output.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("expected exactly 4 court corners, got {0}")]
    CornerCount(usize),

    #[error("court corners are degenerate: three of the four points are collinear")]
    DegenerateCourt,

    #[error("perspective division undefined for point ({x:.1}, {y:.1})")]
    ProjectionUndefined { x: f64, y: f64 },

    #[error("no frame has all four players visible; cannot assign court roles")]
    NoCalibrationFrame,

    #[error("invalid perception input: {0}")]
    Input(String),

    /// Inference collaborator failures propagate unchanged. The pipeline
    /// never retries inference; a failure there usually means an exhausted
    /// resource, not a flaky call.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
