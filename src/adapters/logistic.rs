//! Logistic regression: Implementation of `Classifier` from exported fit parameters.

use serde::{Deserialize, Serialize};

use crate::domain::{NormalizedVector, PredictionError};
use crate::ports::Classifier;

/// Fitted binary logistic regression.
///
/// `coef_` is a single row over the normalized features, `intercept_` a single
/// value, and `classes_` the two class labels in output order. The positive
/// (COPD) class is index 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(rename = "coef_")]
    coef: Vec<Vec<f64>>,

    #[serde(rename = "intercept_")]
    intercept: Vec<f64>,

    #[serde(rename = "classes_", default = "default_classes")]
    classes: Vec<i64>,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

/// Logistic function, without overflow for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    /// Create a model from fitted parameters.
    ///
    /// # Errors
    /// Returns error if the parameters fail `validate`.
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, String> {
        let model = Self {
            coef: vec![coef],
            intercept: vec![intercept],
            classes: default_classes(),
        };
        model.validate()?;
        Ok(model)
    }

    /// Check parameter shapes and values.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() != 2 || self.classes[0] == self.classes[1] {
            return Err(format!(
                "expected two distinct classes, got {:?}",
                self.classes
            ));
        }
        if self.coef.len() != 1 {
            return Err(format!(
                "coef_ must have exactly one row for a binary model, got {}",
                self.coef.len()
            ));
        }
        if self.coef[0].is_empty() {
            return Err("coef_ row is empty".into());
        }
        if self.intercept.len() != 1 {
            return Err(format!(
                "intercept_ must have exactly one value, got {}",
                self.intercept.len()
            ));
        }
        if self.coef[0].iter().chain(&self.intercept).any(|v| !v.is_finite()) {
            return Err("coefficients must be finite".into());
        }
        Ok(())
    }

    /// Label of the class whose probability is reported as the risk score.
    #[must_use]
    pub fn positive_class(&self) -> i64 {
        self.classes[1]
    }

    /// Linear decision value `coef · x + intercept`.
    ///
    /// # Errors
    /// Returns `PredictionError::Inference` on arity mismatch or a non-finite result.
    pub fn decision_function(&self, x: &[f64]) -> Result<f64, PredictionError> {
        let coef = &self.coef[0];
        if x.len() != coef.len() {
            return Err(PredictionError::Inference(format!(
                "model expects {} features, got {}",
                coef.len(),
                x.len()
            )));
        }

        let z = coef.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + self.intercept[0];
        if !z.is_finite() {
            return Err(PredictionError::Inference(
                "decision value is not finite".into(),
            ));
        }
        Ok(z)
    }
}

impl Classifier for LogisticRegression {
    fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, x: &NormalizedVector) -> Result<[f64; 2], PredictionError> {
        let z = self.decision_function(x.as_slice())?;
        let p1 = sigmoid(z);
        tracing::trace!(decision = z, "Computed logistic decision value");
        Ok([1.0 - p1, p1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(values: Vec<f64>) -> NormalizedVector {
        NormalizedVector::new(values).expect("finite values")
    }

    #[test]
    fn test_zero_decision_is_even_odds() {
        let model = LogisticRegression::new(vec![1.0, -1.0], 0.0).expect("valid");
        let proba = model
            .predict_proba(&normalized(vec![2.0, 2.0]))
            .expect("should predict");

        assert!((proba[0] - 0.5).abs() < 1e-12);
        assert!((proba[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let model = LogisticRegression::new(vec![0.62, 0.31], -0.18).expect("valid");
        let proba = model
            .predict_proba(&normalized(vec![1.3, -0.4]))
            .expect("should predict");

        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        let expected = 1.0 / (1.0 + (-(0.62 * 1.3 + 0.31 * -0.4 - 0.18_f64)).exp());
        assert!((proba[1] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0) < 1e-300);
        assert!((sigmoid(800.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_arity_mismatch_is_inference_error() {
        let model = LogisticRegression::new(vec![1.0, 1.0, 1.0], 0.0).expect("valid");
        let err = model
            .predict_proba(&normalized(vec![1.0]))
            .expect_err("must fail");
        assert!(matches!(err, PredictionError::Inference(_)));
    }

    #[test]
    fn test_overflowing_decision_is_inference_error() {
        let model = LogisticRegression::new(vec![f64::MAX, f64::MAX], 0.0).expect("valid");
        let err = model
            .predict_proba(&normalized(vec![f64::MAX, f64::MAX]))
            .expect_err("must fail");
        assert!(matches!(err, PredictionError::Inference(_)));
    }

    #[test]
    fn test_deserialize_exported_attributes() {
        let model: LogisticRegression = serde_json::from_str(
            r#"{"classes_": [0, 1], "coef_": [[0.5, -0.25]], "intercept_": [0.1]}"#,
        )
        .expect("parses");
        assert!(model.validate().is_ok());
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.positive_class(), 1);
    }

    #[test]
    fn test_validation() {
        let multiclass: LogisticRegression = serde_json::from_str(
            r#"{"classes_": [0, 1, 2], "coef_": [[0.5], [0.1], [0.2]], "intercept_": [0.1, 0.0, 0.0]}"#,
        )
        .expect("parses");
        assert!(multiclass.validate().is_err());

        assert!(LogisticRegression::new(vec![], 0.0).is_err());
        assert!(LogisticRegression::new(vec![f64::NAN], 0.0).is_err());
    }
}
