//! Classifier port: Trait for a fitted binary classifier.

use crate::domain::{NormalizedVector, PredictionError};

/// A fitted, deterministic two-class probabilistic model.
pub trait Classifier: Send + Sync {
    /// Number of input features the model expects.
    fn n_features(&self) -> usize;

    /// Class probabilities `[p(class 0), p(class 1)]`.
    ///
    /// # Errors
    /// Returns `PredictionError::Inference` on any numeric or shape failure.
    fn predict_proba(&self, x: &NormalizedVector) -> Result<[f64; 2], PredictionError>;
}
