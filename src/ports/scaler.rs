//! Scaler port: Trait for a fitted feature normalizer.

use crate::domain::PredictionError;

/// A fitted, deterministic per-feature transform.
///
/// Implementations only apply parameters fixed at export time; they never fit.
pub trait Scaler: Send + Sync {
    /// Number of features the scaler was fitted on.
    fn n_features(&self) -> usize;

    /// Transform values in model order.
    ///
    /// Callers pass exactly `n_features()` values.
    ///
    /// # Errors
    /// Returns `PredictionError::Inference` if the transform cannot be applied.
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, PredictionError>;
}
