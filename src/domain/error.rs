//! Per-request error type.

use super::RangeViolation;

/// Error type for a single prediction request.
///
/// None of these are fatal: the request fails and the service stays available.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Shape mismatch: expected {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Input out of range: {}", join_violations(.0))]
    OutOfRange(Vec<RangeViolation>),
}

impl PredictionError {
    /// Stable machine-readable kind, used in session error responses.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFeature(_) => "missing_feature",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::Inference(_) => "inference",
            Self::OutOfRange(_) => "out_of_range",
        }
    }
}

fn join_violations(violations: &[RangeViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
