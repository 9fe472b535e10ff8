//! Stateless pipeline stages between the builder and the interpreter.

use crate::domain::{FeatureVector, NormalizedVector, PredictionError, RiskScore};
use crate::ports::{Classifier, Scaler};

/// Apply the fitted scaler to a model-ordered vector.
///
/// # Errors
/// Returns `PredictionError::ShapeMismatch` if the vector arity differs from
/// the scaler's, or `PredictionError::Inference` if a transformed value is
/// not finite.
pub fn normalize<S: Scaler + ?Sized>(
    vec: &FeatureVector,
    scaler: &S,
) -> Result<NormalizedVector, PredictionError> {
    let expected = scaler.n_features();
    if vec.len() != expected {
        return Err(PredictionError::ShapeMismatch {
            expected,
            actual: vec.len(),
        });
    }
    NormalizedVector::new(scaler.transform(vec.as_slice())?)
}

/// Score a normalized vector: the probability of class index 1.
///
/// # Errors
/// Returns `PredictionError::Inference` on any shape or numeric failure,
/// including a probability outside [0, 1].
pub fn predict<C: Classifier + ?Sized>(
    vec: &NormalizedVector,
    model: &C,
) -> Result<RiskScore, PredictionError> {
    if vec.len() != model.n_features() {
        return Err(PredictionError::Inference(format!(
            "classifier expects {} features, got {}",
            model.n_features(),
            vec.len()
        )));
    }
    let [_, positive] = model.predict_proba(vec)?;
    RiskScore::new(positive)
}
